//! Listing types for Listwell
//!
//! A listing is a unit of marketplace inventory with a bounded number of
//! contact slots ("intros"). Listings are opened with zero intros, fill up
//! one intro at a time, close once full, and stay visible for a bounded
//! window after closing.

use crate::{ListingId, ListwellError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of work a listing asks for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Websites and web applications
    WebDevelopment,
    /// iOS and Android apps
    MobileApps,
    /// Brand, product and UI design
    Design,
    /// Growth and paid acquisition
    Marketing,
    /// Dashboards, reporting and analysis
    DataAnalytics,
    /// Workflow automation and integrations
    Automation,
    /// Copy, content and documentation
    Copywriting,
    /// Strategy and advisory work
    Consulting,
    /// Written by an external tool, outside the taxonomy
    Custom(String),
}

impl Category {
    /// The fixed taxonomy, in round-robin order
    pub const TAXONOMY: [Category; 8] = [
        Category::WebDevelopment,
        Category::MobileApps,
        Category::Design,
        Category::Marketing,
        Category::DataAnalytics,
        Category::Automation,
        Category::Copywriting,
        Category::Consulting,
    ];

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::WebDevelopment => "Web Development",
            Self::MobileApps => "Mobile Apps",
            Self::Design => "Design",
            Self::Marketing => "Marketing",
            Self::DataAnalytics => "Data & Analytics",
            Self::Automation => "Automation",
            Self::Copywriting => "Copywriting",
            Self::Consulting => "Consulting",
            Self::Custom(name) => name,
        }
    }

    /// Storage slug
    pub fn slug(&self) -> &str {
        match self {
            Self::WebDevelopment => "web_development",
            Self::MobileApps => "mobile_apps",
            Self::Design => "design",
            Self::Marketing => "marketing",
            Self::DataAnalytics => "data_analytics",
            Self::Automation => "automation",
            Self::Copywriting => "copywriting",
            Self::Consulting => "consulting",
            Self::Custom(name) => name,
        }
    }

    /// Parse a storage slug; anything outside the taxonomy becomes `Custom`
    pub fn from_slug(slug: &str) -> Self {
        Self::TAXONOMY
            .iter()
            .find(|c| c.slug().eq_ignore_ascii_case(slug))
            .cloned()
            .unwrap_or_else(|| Self::Custom(slug.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Lifecycle status of a listing
///
/// The engine only writes `Open` and `Closed`. The remaining variants are
/// written by administrative tooling and are never candidates for any
/// controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListingStatus {
    /// Accepting intros
    Open,
    /// Full; visible until its visibility window ends
    Closed,
    /// Archived by an administrator
    Archived,
    /// Cancelled by an administrator
    Cancelled,
    /// Any other value found in storage
    Other(String),
}

impl ListingStatus {
    /// Canonical lowercase representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Archived => "archived",
            Self::Cancelled => "cancelled",
            Self::Other(raw) => raw,
        }
    }

    /// Translate a stored status string, tolerating mixed casing and spelling
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Self::Open,
            "closed" => Self::Closed,
            "archived" => Self::Archived,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl From<String> for ListingStatus {
    fn from(raw: String) -> Self {
        Self::from_raw(&raw)
    }
}

impl From<ListingStatus> for String {
    fn from(status: ListingStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget range a listing advertises, in whole currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
}

impl PriceRange {
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min > max {
            return Err(ListwellError::invalid_input(
                "price",
                format!("minimum {} is above maximum {}", min, max),
            ));
        }
        Ok(Self { min, max })
    }
}

/// Everything needed to open a new listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    pub summary: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub price: PriceRange,
    pub capacity: u32,
    pub created_at: DateTime<Utc>,
}

/// A marketplace listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Unique listing ID
    pub id: ListingId,
    pub title: String,
    pub summary: String,
    pub category: Category,
    /// Tags for search
    pub tags: Vec<String>,
    pub price: PriceRange,
    pub status: ListingStatus,
    /// Maximum intros before the listing closes
    pub capacity: u32,
    /// Intros granted so far, never above `capacity`
    pub intros_granted: u32,
    /// Defines the listing's age
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when the listing closes
    pub filled_at: Option<DateTime<Utc>>,
    /// End of the post-closure visibility window
    pub visible_until: Option<DateTime<Utc>>,
    pub views: u64,
}

impl Listing {
    /// Open a new listing with no intros granted
    pub fn open(draft: ListingDraft) -> Result<Self> {
        if draft.capacity == 0 {
            return Err(ListwellError::invalid_input("capacity", "must be positive"));
        }
        let price = PriceRange::new(draft.price.min, draft.price.max)?;

        Ok(Self {
            id: ListingId::new(),
            title: draft.title,
            summary: draft.summary,
            category: draft.category,
            tags: draft.tags,
            price,
            status: ListingStatus::Open,
            capacity: draft.capacity,
            intros_granted: 0,
            created_at: draft.created_at,
            filled_at: None,
            visible_until: None,
            views: 0,
        })
    }

    /// Age at `now`; listings created in the future have age zero
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).max(Duration::zero())
    }

    pub fn is_full(&self) -> bool {
        self.intros_granted >= self.capacity
    }

    /// Whether consumers can see this listing at `now`
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            ListingStatus::Open => true,
            ListingStatus::Closed => self.visible_until.map_or(false, |until| until > now),
            _ => false,
        }
    }

    /// Grant one intro if the listing is open, not full, and below `allowed`.
    ///
    /// Returns whether the intro was granted.
    pub fn grant_intro(&mut self, allowed: u32) -> bool {
        if !self.status.is_open() || self.is_full() || self.intros_granted >= allowed {
            return false;
        }
        self.intros_granted += 1;
        true
    }

    /// Close the listing if it is open and full.
    ///
    /// Returns whether the transition happened.
    pub fn close_if_full(&mut self, now: DateTime<Utc>, visibility_window: Duration) -> bool {
        if !self.status.is_open() || !self.is_full() {
            return false;
        }
        self.status = ListingStatus::Closed;
        self.filled_at = Some(now);
        self.visible_until = Some(now + visibility_window);
        true
    }

    /// Check the lifecycle invariants that must hold for every stored listing
    pub fn check_invariants(&self) -> Result<()> {
        if self.intros_granted > self.capacity {
            return Err(ListwellError::invalid_input(
                "intros_granted",
                format!("{} exceeds capacity {}", self.intros_granted, self.capacity),
            ));
        }
        let closed = self.status == ListingStatus::Closed;
        if closed != self.filled_at.is_some() {
            return Err(ListwellError::invalid_input(
                "filled_at",
                "must be set exactly when the listing is closed",
            ));
        }
        if self.visible_until.is_some() && !closed {
            return Err(ListwellError::invalid_input(
                "visible_until",
                "only closed listings carry a visibility window",
            ));
        }
        Ok(())
    }
}
