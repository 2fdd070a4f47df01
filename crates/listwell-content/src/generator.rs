//! Content generator implementations

use async_trait::async_trait;
use listwell_types::Category;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::types::*;

/// Trait for listing content generators
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Get the generator name
    fn name(&self) -> &'static str;

    /// Produce a title, summary and tags for one new listing
    async fn generate(&self, request: ContentRequest) -> Result<GeneratedContent>;
}

// ============================================================================
// Template Generator (Deterministic, Default)
// ============================================================================

struct Template {
    title: &'static str,
    summary: &'static str,
    tags: &'static [&'static str],
}

const SUBJECTS: &[&str] = &[
    "a neighbourhood bakery",
    "a boutique fitness studio",
    "a B2B SaaS startup",
    "an independent bookshop",
    "a regional logistics firm",
    "a dental practice",
    "a nonprofit food bank",
    "a craft brewery",
];

/// Template-based generator with no external dependencies
///
/// Picks a category template and a subject at random. Seed it for
/// reproducible output.
pub struct TemplateGenerator {
    rng: Mutex<StdRng>,
}

impl TemplateGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn templates(category: &Category) -> &'static [Template] {
        match category {
            Category::WebDevelopment => &[
                Template {
                    title: "Marketing site rebuild for {subject}",
                    summary: "Replace an ageing site for {subject} with a fast, mobile-first build and a simple CMS.",
                    tags: &["web", "cms", "responsive"],
                },
                Template {
                    title: "Online booking flow for {subject}",
                    summary: "Add self-serve booking and payment to the existing website of {subject}.",
                    tags: &["web", "booking", "payments"],
                },
            ],
            Category::MobileApps => &[Template {
                title: "Loyalty app MVP for {subject}",
                summary: "Ship a small iOS and Android app for {subject} with stamps, rewards and push offers.",
                tags: &["mobile", "ios", "android"],
            }],
            Category::Design => &[
                Template {
                    title: "Brand refresh for {subject}",
                    summary: "New logo, palette and type system for {subject}, delivered with usage guidelines.",
                    tags: &["branding", "logo", "identity"],
                },
                Template {
                    title: "Dashboard UI redesign for {subject}",
                    summary: "Rework cluttered internal screens at {subject} into a clear, consistent interface.",
                    tags: &["ui", "ux", "figma"],
                },
            ],
            Category::Marketing => &[Template {
                title: "Paid social launch for {subject}",
                summary: "Plan, launch and tune a first paid social campaign for {subject} on a fixed monthly budget.",
                tags: &["ads", "social", "growth"],
            }],
            Category::DataAnalytics => &[Template {
                title: "Sales reporting dashboard for {subject}",
                summary: "Connect the order data of {subject} to a weekly dashboard the owners actually read.",
                tags: &["analytics", "dashboard", "sql"],
            }],
            Category::Automation => &[Template {
                title: "Invoice workflow automation for {subject}",
                summary: "Remove manual copy-paste between the inbox, spreadsheet and accounting tool of {subject}.",
                tags: &["automation", "integrations", "no-code"],
            }],
            Category::Copywriting => &[Template {
                title: "Website copy rewrite for {subject}",
                summary: "Rewrite the home, about and services pages of {subject} in a clear, confident voice.",
                tags: &["copy", "content", "seo"],
            }],
            Category::Consulting => &[Template {
                title: "Pricing strategy review for {subject}",
                summary: "Review current packages and margins at {subject} and recommend a simpler pricing model.",
                tags: &["strategy", "pricing"],
            }],
            Category::Custom(_) => &[Template {
                title: "Short project for {subject}",
                summary: "A scoped engagement for {subject}; details shared with introduced providers.",
                tags: &["general"],
            }],
        }
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentGenerator for TemplateGenerator {
    fn name(&self) -> &'static str {
        "Template"
    }

    async fn generate(&self, request: ContentRequest) -> Result<GeneratedContent> {
        let mut rng = self.rng.lock();
        let category = match request.category {
            Some(category) => category,
            None => Category::TAXONOMY
                .choose(&mut *rng)
                .cloned()
                .unwrap_or(Category::Consulting),
        };

        let templates = Self::templates(&category);
        let template = templates.choose(&mut *rng).ok_or_else(|| ContentError::Rejected {
            message: format!("no template for {}", category),
        })?;
        let subject = SUBJECTS.choose(&mut *rng).copied().unwrap_or("a small business");

        let mut tags: Vec<String> = template.tags.iter().map(|t| t.to_string()).collect();
        tags.push(category.slug().to_string());
        debug!(category = %category, subject, "Generated listing content from template");

        Ok(GeneratedContent {
            title: template.title.replace("{subject}", subject),
            summary: template.summary.replace("{subject}", subject),
            tags,
        })
    }
}
