//! Listwell Listing Store
//!
//! Persistence for marketplace listings behind the [`ListingStore`] trait.
//!
//! # Implementations
//!
//! - [`InMemoryListingStore`]: a `tokio::sync::RwLock`-guarded map, used by
//!   tests and local runs
//! - [`SqliteListingStore`]: SQLite via SQLx, schema in `migrations/`
//!
//! # Conditional Updates
//!
//! Every mutation is a single-row conditional update that reports whether it
//! applied. Counters are incremented in place (`x = x + 1 WHERE ...`), never
//! read, modified and written back, so overlapping maintenance runs can not
//! push a listing past its capacity or close it twice.

pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listwell_types::{Listing, ListingId};
use serde::{Deserialize, Serialize};

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryListingStore;
pub use models::DbListing;
pub use sqlite::SqliteListingStore;

/// Listing store trait
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Insert a new listing
    async fn create(&self, listing: &Listing) -> StoreResult<()>;

    /// Get a listing by id
    async fn get(&self, id: &ListingId) -> StoreResult<Option<Listing>>;

    /// Number of open listings
    async fn count_open(&self) -> StoreResult<u64>;

    /// Open listings, oldest first (ties by id), at most `limit`
    async fn open_oldest_first(&self, limit: usize) -> StoreResult<Vec<Listing>>;

    /// Open listings with at least one intro, oldest first, at most `limit`
    async fn closable_candidates(&self, limit: usize) -> StoreResult<Vec<Listing>>;

    /// Listings visible at `now`, newest first, at most `limit`
    async fn visible_newest_first(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<Listing>>;

    /// Grant one intro if the listing is open, below capacity and below `allowed`.
    ///
    /// Returns `false` when the condition no longer holds.
    async fn grant_intro(&self, id: &ListingId, allowed: u32) -> StoreResult<bool>;

    /// Close the listing if it is still open and full.
    ///
    /// Returns `false` when it was already closed or is not full.
    async fn close_if_full(
        &self,
        id: &ListingId,
        filled_at: DateTime<Utc>,
        visible_until: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Increment the view counter. Returns `false` for an unknown id.
    async fn bump_views(&self, id: &ListingId) -> StoreResult<bool>;

    /// Count listings by lifecycle bucket at `now`
    async fn census(&self, now: DateTime<Utc>) -> StoreResult<ListingCensus>;
}

/// Listing counts by lifecycle bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCensus {
    pub open: u64,
    /// Closed and still inside the visibility window
    pub closed_visible: u64,
    /// Closed with the visibility window elapsed
    pub closed_expired: u64,
    /// Any status written by administrative tooling
    pub administrative: u64,
}

impl ListingCensus {
    pub fn total(&self) -> u64 {
        self.open + self.closed_visible + self.closed_expired + self.administrative
    }

    /// Listings consumers can currently see
    pub fn visible(&self) -> u64 {
        self.open + self.closed_visible
    }
}
