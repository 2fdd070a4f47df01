//! Row models - mapped from the SQLite `listings` table
//!
//! This is the only place raw status strings, epoch-millisecond timestamps
//! and JSON tag columns are translated to and from domain types.

use chrono::{DateTime, Utc};
use listwell_types::{Category, Listing, ListingId, ListingStatus, PriceRange};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{StoreError, StoreResult};

#[derive(Debug, Clone, FromRow)]
pub struct DbListing {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub category: String,
    pub tags: String,
    pub price_min: i64,
    pub price_max: i64,
    pub status: String,
    pub capacity: i64,
    pub intros_granted: i64,
    pub created_at: i64,
    pub filled_at: Option<i64>,
    pub visible_until: Option<i64>,
    pub views: i64,
}

impl DbListing {
    pub fn from_listing(listing: &Listing) -> StoreResult<Self> {
        Ok(Self {
            id: listing.id.0,
            title: listing.title.clone(),
            summary: listing.summary.clone(),
            category: listing.category.slug().to_string(),
            tags: serde_json::to_string(&listing.tags)?,
            price_min: i64::from(listing.price.min),
            price_max: i64::from(listing.price.max),
            status: listing.status.as_str().to_string(),
            capacity: i64::from(listing.capacity),
            intros_granted: i64::from(listing.intros_granted),
            created_at: listing.created_at.timestamp_millis(),
            filled_at: listing.filled_at.map(|t| t.timestamp_millis()),
            visible_until: listing.visible_until.map(|t| t.timestamp_millis()),
            views: i64::try_from(listing.views)
                .map_err(|_| StoreError::InvalidInput("views out of range".to_string()))?,
        })
    }
}

impl TryFrom<DbListing> for Listing {
    type Error = StoreError;

    fn try_from(row: DbListing) -> StoreResult<Self> {
        let id = ListingId::from(row.id);
        Ok(Listing {
            id,
            title: row.title,
            summary: row.summary,
            category: Category::from_slug(&row.category),
            tags: serde_json::from_str(&row.tags)?,
            price: PriceRange {
                min: narrow(row.price_min, "price_min", &id)?,
                max: narrow(row.price_max, "price_max", &id)?,
            },
            status: ListingStatus::from_raw(&row.status),
            capacity: narrow(row.capacity, "capacity", &id)?,
            intros_granted: narrow(row.intros_granted, "intros_granted", &id)?,
            created_at: millis_to_utc(row.created_at, &id)?,
            filled_at: row.filled_at.map(|ms| millis_to_utc(ms, &id)).transpose()?,
            visible_until: row.visible_until.map(|ms| millis_to_utc(ms, &id)).transpose()?,
            views: u64::try_from(row.views)
                .map_err(|_| StoreError::Corrupt(format!("{}: negative views", id)))?,
        })
    }
}

fn narrow(value: i64, column: &str, id: &ListingId) -> StoreResult<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{}: {} = {} out of range", id, column, value)))
}

fn millis_to_utc(ms: i64, id: &ListingId) -> StoreResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Corrupt(format!("{}: timestamp {} out of range", id, ms)))
}
