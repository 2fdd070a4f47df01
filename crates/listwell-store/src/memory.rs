//! In-memory listing store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listwell_types::{Listing, ListingId, ListingStatus};
use tokio::sync::RwLock;

use crate::{ListingCensus, ListingStore, StoreError, StoreResult};

/// In-memory listing store
///
/// Every conditional update runs under one write guard, which gives the same
/// check-and-set atomicity as a single SQL `UPDATE ... WHERE`.
#[derive(Clone, Default)]
pub struct InMemoryListingStore {
    listings: Arc<RwLock<HashMap<ListingId, Listing>>>,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored listing, oldest first
    pub async fn all(&self) -> Vec<Listing> {
        let listings = self.listings.read().await;
        let mut all: Vec<Listing> = listings.values().cloned().collect();
        sort_oldest_first(&mut all);
        all
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }

    async fn select<F>(&self, limit: usize, newest_first: bool, keep: F) -> Vec<Listing>
    where
        F: Fn(&Listing) -> bool,
    {
        let listings = self.listings.read().await;
        let mut selected: Vec<Listing> = listings.values().filter(|l| keep(l)).cloned().collect();
        sort_oldest_first(&mut selected);
        if newest_first {
            selected.reverse();
        }
        selected.truncate(limit);
        selected
    }
}

fn sort_oldest_first(listings: &mut [Listing]) {
    listings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn create(&self, listing: &Listing) -> StoreResult<()> {
        listing.check_invariants()?;

        let mut listings = self.listings.write().await;
        if listings.contains_key(&listing.id) {
            return Err(StoreError::Duplicate(listing.id.to_string()));
        }
        listings.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn get(&self, id: &ListingId) -> StoreResult<Option<Listing>> {
        Ok(self.listings.read().await.get(id).cloned())
    }

    async fn count_open(&self) -> StoreResult<u64> {
        let listings = self.listings.read().await;
        Ok(listings.values().filter(|l| l.status.is_open()).count() as u64)
    }

    async fn open_oldest_first(&self, limit: usize) -> StoreResult<Vec<Listing>> {
        Ok(self.select(limit, false, |l| l.status.is_open()).await)
    }

    async fn closable_candidates(&self, limit: usize) -> StoreResult<Vec<Listing>> {
        Ok(self
            .select(limit, false, |l| {
                l.status.is_open() && l.intros_granted >= 1 && l.capacity > 0
            })
            .await)
    }

    async fn visible_newest_first(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<Listing>> {
        Ok(self.select(limit, true, |l| l.is_visible_at(now)).await)
    }

    async fn grant_intro(&self, id: &ListingId, allowed: u32) -> StoreResult<bool> {
        let mut listings = self.listings.write().await;
        Ok(listings
            .get_mut(id)
            .map_or(false, |listing| listing.grant_intro(allowed)))
    }

    async fn close_if_full(
        &self,
        id: &ListingId,
        filled_at: DateTime<Utc>,
        visible_until: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut listings = self.listings.write().await;
        Ok(listings.get_mut(id).map_or(false, |listing| {
            listing.close_if_full(filled_at, visible_until - filled_at)
        }))
    }

    async fn bump_views(&self, id: &ListingId) -> StoreResult<bool> {
        let mut listings = self.listings.write().await;
        match listings.get_mut(id) {
            Some(listing) => {
                listing.views = listing.views.saturating_add(1);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn census(&self, now: DateTime<Utc>) -> StoreResult<ListingCensus> {
        let listings = self.listings.read().await;
        let mut census = ListingCensus::default();
        for listing in listings.values() {
            match listing.status {
                ListingStatus::Open => census.open += 1,
                ListingStatus::Closed if listing.is_visible_at(now) => census.closed_visible += 1,
                ListingStatus::Closed => census.closed_expired += 1,
                _ => census.administrative += 1,
            }
        }
        Ok(census)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use listwell_types::{Category, ListingDraft, PriceRange};

    fn listing_at(created_at: DateTime<Utc>, capacity: u32) -> Listing {
        Listing::open(ListingDraft {
            title: "Shopify theme tweaks".to_string(),
            summary: "Adjust the product page layout".to_string(),
            category: Category::WebDevelopment,
            tags: vec![],
            price: PriceRange { min: 300, max: 600 },
            capacity,
            created_at,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let store = InMemoryListingStore::new();
        let listing = listing_at(Utc::now(), 3);
        store.create(&listing).await.unwrap();
        assert!(matches!(
            store.create(&listing).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_broken_invariants() {
        let store = InMemoryListingStore::new();
        let mut listing = listing_at(Utc::now(), 3);
        listing.intros_granted = 4;
        assert!(matches!(
            store.create(&listing).await,
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_open_window_is_oldest_first_and_bounded() {
        let store = InMemoryListingStore::new();
        let now = Utc::now();
        for hours in [5, 1, 9, 3] {
            store
                .create(&listing_at(now - Duration::hours(hours), 3))
                .await
                .unwrap();
        }

        let window = store.open_oldest_first(3).await.unwrap();
        let ages: Vec<i64> = window.iter().map(|l| l.age_at(now).num_hours()).collect();
        assert_eq!(ages, vec![9, 5, 3]);
    }

    #[tokio::test]
    async fn test_grant_intro_is_conditional() {
        let store = InMemoryListingStore::new();
        let listing = listing_at(Utc::now(), 1);
        store.create(&listing).await.unwrap();

        assert!(!store.grant_intro(&listing.id, 0).await.unwrap());
        assert!(store.grant_intro(&listing.id, 1).await.unwrap());
        assert!(!store.grant_intro(&listing.id, 5).await.unwrap());
        assert!(!store.grant_intro(&ListingId::new(), 5).await.unwrap());

        let stored = store.get(&listing.id).await.unwrap().unwrap();
        assert_eq!(stored.intros_granted, 1);
    }

    #[tokio::test]
    async fn test_close_if_full_applies_once() {
        let store = InMemoryListingStore::new();
        let now = Utc::now();
        let listing = listing_at(now - Duration::hours(50), 1);
        store.create(&listing).await.unwrap();

        let until = now + Duration::hours(72);
        assert!(!store.close_if_full(&listing.id, now, until).await.unwrap());
        store.grant_intro(&listing.id, 1).await.unwrap();
        assert!(store.close_if_full(&listing.id, now, until).await.unwrap());
        assert!(!store
            .close_if_full(&listing.id, now + Duration::hours(1), until)
            .await
            .unwrap());

        let stored = store.get(&listing.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ListingStatus::Closed);
        assert_eq!(stored.filled_at, Some(now));
        assert_eq!(stored.visible_until, Some(until));
    }

    #[tokio::test]
    async fn test_visible_query_and_census() {
        let store = InMemoryListingStore::new();
        let now = Utc::now();

        let open = listing_at(now - Duration::hours(1), 3);
        store.create(&open).await.unwrap();

        let mut fresh_closed = listing_at(now - Duration::hours(60), 1);
        fresh_closed.intros_granted = 1;
        fresh_closed.close_if_full(now - Duration::hours(1), Duration::hours(72));
        store.create(&fresh_closed).await.unwrap();

        let mut stale_closed = listing_at(now - Duration::hours(200), 1);
        stale_closed.intros_granted = 1;
        stale_closed.close_if_full(now - Duration::hours(100), Duration::hours(72));
        store.create(&stale_closed).await.unwrap();

        let mut archived = listing_at(now - Duration::hours(2), 3);
        archived.status = ListingStatus::from_raw("Archived");
        store.create(&archived).await.unwrap();

        let visible = store.visible_newest_first(now, 10).await.unwrap();
        let ids: Vec<ListingId> = visible.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![open.id, fresh_closed.id]);

        let census = store.census(now).await.unwrap();
        assert_eq!(
            census,
            ListingCensus {
                open: 1,
                closed_visible: 1,
                closed_expired: 1,
                administrative: 1,
            }
        );
        assert_eq!(census.visible(), 2);
        assert_eq!(store.count_open().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_closable_candidates_skip_untouched() {
        let store = InMemoryListingStore::new();
        let now = Utc::now();
        let untouched = listing_at(now - Duration::hours(3), 3);
        let mut touched = listing_at(now - Duration::hours(2), 3);
        touched.intros_granted = 2;
        store.create(&untouched).await.unwrap();
        store.create(&touched).await.unwrap();

        let candidates = store.closable_candidates(10).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, touched.id);
    }
}
