//! Activity simulator
//!
//! Bumps the view counter of the most recently created visible listings so
//! the catalogue shows some engagement between real visits.

use chrono::{DateTime, Utc};
use listwell_store::ListingStore;
use tracing::{debug, warn};

use crate::config::ActivityConfig;
use crate::EngineResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityOutcome {
    pub sampled: usize,
    pub bumped: u32,
    pub failed: u32,
}

pub struct ActivitySimulator {
    config: ActivityConfig,
}

impl ActivitySimulator {
    pub fn new(config: ActivityConfig) -> Self {
        Self { config }
    }

    pub async fn run(
        &self,
        store: &dyn ListingStore,
        now: DateTime<Utc>,
    ) -> EngineResult<ActivityOutcome> {
        let mut outcome = ActivityOutcome::default();
        if self.config.sample_size == 0 {
            return Ok(outcome);
        }

        let sample = store
            .visible_newest_first(now, self.config.sample_size)
            .await?;
        outcome.sampled = sample.len();

        for listing in sample {
            match store.bump_views(&listing.id).await {
                Ok(true) => outcome.bumped += 1,
                Ok(false) => debug!(listing_id = %listing.id, "Listing vanished before view bump"),
                Err(e) => {
                    outcome.failed += 1;
                    warn!(
                        listing_id = %listing.id,
                        error = %e,
                        transient = e.is_transient(),
                        "View bump failed"
                    );
                }
            }
        }

        debug!(sampled = outcome.sampled, bumped = outcome.bumped, "Simulated activity");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use listwell_store::InMemoryListingStore;
    use listwell_types::{Category, Listing, ListingDraft, ListingStatus, PriceRange};

    fn listing(created_at: DateTime<Utc>) -> Listing {
        Listing::open(ListingDraft {
            title: "Product photography".to_string(),
            summary: "Forty packshots on white".to_string(),
            category: Category::Design,
            tags: vec![],
            price: PriceRange { min: 600, max: 900 },
            capacity: 3,
            created_at,
        })
        .unwrap()
    }

    async fn views(store: &InMemoryListingStore, listing: &Listing) -> u64 {
        store.get(&listing.id).await.unwrap().unwrap().views
    }

    #[tokio::test]
    async fn test_bumps_only_the_newest_sample() {
        let store = InMemoryListingStore::new();
        let now = Utc::now();
        let mut listings = Vec::new();
        for hours in 1..=5 {
            let l = listing(now - Duration::hours(hours));
            store.create(&l).await.unwrap();
            listings.push(l);
        }

        let outcome = ActivitySimulator::new(ActivityConfig { sample_size: 2 })
            .run(&store, now)
            .await
            .unwrap();
        assert_eq!(outcome.bumped, 2);

        assert_eq!(views(&store, &listings[0]).await, 1);
        assert_eq!(views(&store, &listings[1]).await, 1);
        for l in &listings[2..] {
            assert_eq!(views(&store, l).await, 0);
        }
    }

    #[tokio::test]
    async fn test_invisible_listings_are_not_touched() {
        let store = InMemoryListingStore::new();
        let now = Utc::now();

        let mut expired = listing(now - Duration::hours(100));
        expired.status = ListingStatus::Closed;
        expired.intros_granted = 3;
        expired.filled_at = Some(now - Duration::hours(80));
        expired.visible_until = Some(now - Duration::hours(8));
        store.create(&expired).await.unwrap();

        let mut archived = listing(now - Duration::minutes(5));
        archived.status = ListingStatus::Archived;
        store.create(&archived).await.unwrap();

        let outcome = ActivitySimulator::new(ActivityConfig::default())
            .run(&store, now)
            .await
            .unwrap();
        assert_eq!(outcome.sampled, 0);
        assert_eq!(views(&store, &expired).await, 0);
        assert_eq!(views(&store, &archived).await, 0);
    }

    #[tokio::test]
    async fn test_zero_sample_disables_simulation() {
        let store = InMemoryListingStore::new();
        let now = Utc::now();
        let l = listing(now);
        store.create(&l).await.unwrap();

        let outcome = ActivitySimulator::new(ActivityConfig { sample_size: 0 })
            .run(&store, now)
            .await
            .unwrap();
        assert_eq!(outcome, ActivityOutcome::default());
        assert_eq!(views(&store, &l).await, 0);
    }
}
