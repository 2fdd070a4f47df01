//! Closure manager
//!
//! Transitions full open listings to closed and stamps the visibility
//! window. A closed listing stays visible until `filled_at + window` and is
//! never reopened.

use chrono::{DateTime, Utc};
use listwell_store::ListingStore;
use listwell_types::ListingId;
use tracing::{debug, info, warn};

use crate::config::ClosureConfig;
use crate::EngineResult;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosureOutcome {
    pub examined: usize,
    pub closed: Vec<ListingId>,
    pub failed: u32,
}

pub struct ClosureManager {
    config: ClosureConfig,
}

impl ClosureManager {
    pub fn new(config: ClosureConfig) -> Self {
        Self { config }
    }

    pub async fn run(
        &self,
        store: &dyn ListingStore,
        now: DateTime<Utc>,
    ) -> EngineResult<ClosureOutcome> {
        let candidates = store.closable_candidates(self.config.window).await?;
        let visible_until = now + self.config.visibility_window();
        let mut outcome = ClosureOutcome::default();

        for listing in candidates {
            outcome.examined += 1;
            if !listing.is_full() {
                continue;
            }

            match store.close_if_full(&listing.id, now, visible_until).await {
                Ok(true) => {
                    info!(
                        listing_id = %listing.id,
                        capacity = listing.capacity,
                        visible_until = %visible_until,
                        "Closed full listing"
                    );
                    outcome.closed.push(listing.id);
                }
                Ok(false) => {
                    debug!(listing_id = %listing.id, "Listing already closed");
                }
                Err(e) => {
                    outcome.failed += 1;
                    warn!(
                        listing_id = %listing.id,
                        error = %e,
                        transient = e.is_transient(),
                        "Failed to close listing"
                    );
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use listwell_store::InMemoryListingStore;
    use listwell_types::{Category, Listing, ListingDraft, ListingStatus, PriceRange};

    fn listing(capacity: u32, intros: u32, now: DateTime<Utc>) -> Listing {
        let mut listing = Listing::open(ListingDraft {
            title: "Quarterly bookkeeping".to_string(),
            summary: "Reconcile three months of receipts".to_string(),
            category: Category::Consulting,
            tags: vec![],
            price: PriceRange { min: 800, max: 1200 },
            capacity,
            created_at: now - Duration::hours(60),
        })
        .unwrap();
        listing.intros_granted = intros;
        listing
    }

    #[tokio::test]
    async fn test_full_listing_closes_with_visibility_window() {
        let store = InMemoryListingStore::new();
        let now = Utc::now();
        let full = listing(3, 3, now);
        store.create(&full).await.unwrap();

        let outcome = ClosureManager::new(ClosureConfig::default())
            .run(&store, now)
            .await
            .unwrap();
        assert_eq!(outcome.closed, vec![full.id]);

        let stored = store.get(&full.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ListingStatus::Closed);
        assert_eq!(stored.filled_at, Some(now));
        assert_eq!(stored.visible_until, Some(now + Duration::hours(72)));
    }

    #[tokio::test]
    async fn test_partially_filled_listing_stays_open() {
        let store = InMemoryListingStore::new();
        let now = Utc::now();
        let partial = listing(4, 2, now);
        store.create(&partial).await.unwrap();

        let outcome = ClosureManager::new(ClosureConfig::default())
            .run(&store, now)
            .await
            .unwrap();
        assert_eq!(outcome.examined, 1);
        assert!(outcome.closed.is_empty());
        assert_eq!(
            store.get(&partial.id).await.unwrap().unwrap().status,
            ListingStatus::Open
        );
    }

    #[tokio::test]
    async fn test_second_pass_does_not_move_the_window() {
        let store = InMemoryListingStore::new();
        let now = Utc::now();
        let full = listing(3, 3, now);
        store.create(&full).await.unwrap();

        let manager = ClosureManager::new(ClosureConfig::default());
        manager.run(&store, now).await.unwrap();
        let outcome = manager.run(&store, now + Duration::hours(5)).await.unwrap();

        assert!(outcome.closed.is_empty());
        let stored = store.get(&full.id).await.unwrap().unwrap();
        assert_eq!(stored.filled_at, Some(now));
    }
}
