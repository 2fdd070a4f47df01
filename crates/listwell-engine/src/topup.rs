//! Inventory top-up controller
//!
//! Keeps the number of open listings at or above the configured floor by
//! opening new listings with generated content. Each new listing is
//! back-dated by a random offset so a batch has mixed ages.
//!
//! Categories rotate through the taxonomy starting at the number of listings
//! already stored, so separate one-shot runs keep rotating.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use listwell_content::{ContentGenerator, ContentRequest};
use listwell_store::ListingStore;
use listwell_types::{Category, Listing, ListingDraft, PriceRange};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::TopUpConfig;
use crate::{EngineError, EngineResult};

/// Result of one top-up pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopUpOutcome {
    pub open_before: u64,
    pub target: u64,
    pub created: u32,
    pub failed: u32,
}

pub struct TopUpController {
    config: TopUpConfig,
    generator: Arc<dyn ContentGenerator>,
    rng: StdRng,
}

impl TopUpController {
    pub fn new(config: TopUpConfig, generator: Arc<dyn ContentGenerator>, rng: StdRng) -> Self {
        Self {
            config,
            generator,
            rng,
        }
    }

    /// Open listings until the open count reaches the target.
    ///
    /// Fails only if the open count can not be read; per-listing failures are
    /// logged and counted.
    pub async fn run(
        &mut self,
        store: &dyn ListingStore,
        now: DateTime<Utc>,
    ) -> EngineResult<TopUpOutcome> {
        let open_before = store.count_open().await?;
        let mut outcome = TopUpOutcome {
            open_before,
            target: open_before,
            ..Default::default()
        };

        if open_before >= u64::from(self.config.min_open) {
            debug!(open = open_before, floor = self.config.min_open, "Open inventory at floor");
            return Ok(outcome);
        }

        outcome.target = self.target();
        let missing = outcome.target.saturating_sub(open_before);
        info!(open = open_before, target = outcome.target, missing, "Topping up open listings");

        let mut cursor = self.category_cursor(store, now).await;
        for _ in 0..missing {
            let category = Category::TAXONOMY[cursor % Category::TAXONOMY.len()].clone();
            cursor = cursor.wrapping_add(1);
            match self.open_one(store, now, category.clone()).await {
                Ok(listing) => {
                    outcome.created += 1;
                    debug!(
                        listing_id = %listing.id,
                        category = %category,
                        capacity = listing.capacity,
                        "Opened listing"
                    );
                }
                Err(e) => {
                    outcome.failed += 1;
                    warn!(
                        category = %category,
                        error = %e,
                        transient = e.is_transient(),
                        "Skipping listing creation"
                    );
                }
            }
        }

        Ok(outcome)
    }

    /// The open count this top-up aims for
    fn target(&mut self) -> u64 {
        let floor = self.config.min_open;
        match self.config.max_open {
            Some(ceiling) if ceiling > floor => u64::from(self.rng.gen_range(floor..=ceiling)),
            _ => u64::from(floor),
        }
    }

    /// Where the category rotation resumes
    async fn category_cursor(&mut self, store: &dyn ListingStore, now: DateTime<Utc>) -> usize {
        match store.census(now).await {
            Ok(census) => census.total() as usize,
            Err(e) => {
                warn!(error = %e, "Census unavailable, starting categories at random");
                self.rng.gen_range(0..Category::TAXONOMY.len())
            }
        }
    }

    async fn open_one(
        &mut self,
        store: &dyn ListingStore,
        now: DateTime<Utc>,
        category: Category,
    ) -> EngineResult<Listing> {
        let content = self
            .generator
            .generate(ContentRequest::for_category(category.clone()))
            .await?;
        content.validate()?;

        let draft = ListingDraft {
            title: content.title.trim().to_string(),
            summary: content.summary.trim().to_string(),
            category,
            tags: content.tags,
            price: self.draw_price()?,
            capacity: self.draw_capacity()?,
            created_at: self.draw_created_at(now),
        };

        let listing = Listing::open(draft)?;
        store.create(&listing).await?;
        Ok(listing)
    }

    fn draw_price(&mut self) -> EngineResult<PriceRange> {
        let min = self
            .rng
            .gen_range(self.config.price_min_floor..=self.config.price_min_ceiling);
        let extra = self
            .rng
            .gen_range(self.config.price_extra_min..=self.config.price_extra_max);
        let max = min
            .checked_add(extra)
            .ok_or_else(|| EngineError::config("price range overflow"))?;
        Ok(PriceRange::new(min, max)?)
    }

    fn draw_capacity(&mut self) -> EngineResult<u32> {
        self.config
            .capacity_choices
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| EngineError::config("no capacity choices configured"))
    }

    fn draw_created_at(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let max_secs = self.config.max_backdate().num_seconds().max(0);
        now - Duration::seconds(self.rng.gen_range(0..=max_secs))
    }
}
