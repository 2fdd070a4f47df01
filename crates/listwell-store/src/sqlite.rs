//! SQLite listing store

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listwell_types::{Listing, ListingId};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::{DbListing, ListingCensus, ListingStore, StoreConfig, StoreError, StoreResult};

const COLUMNS: &str = "id, title, summary, category, tags, price_min, price_max, status, \
     capacity, intros_granted, created_at, filled_at, visible_until, views";

// Administrative tooling writes status with inconsistent casing.
const IS_OPEN: &str = "lower(trim(status)) = 'open'";
const IS_CLOSED: &str = "lower(trim(status)) = 'closed'";

/// SQLite-backed listing store
#[derive(Clone)]
pub struct SqliteListingStore {
    pool: SqlitePool,
}

impl SqliteListingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database described by `config` and run migrations
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        info!(url = %config.database_url, "Opening listing store");

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| StoreError::Connection(format!("SQLite: {}", e)))?
            .create_if_missing(config.create_if_missing);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));

        // Each connection to `:memory:` is its own database, so keep exactly one alive.
        if config.is_in_memory() {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(format!("SQLite: {}", e)))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        info!("Running listing store migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_listings(
        &self,
        sql: &str,
        now: Option<DateTime<Utc>>,
        limit: usize,
    ) -> StoreResult<Vec<Listing>> {
        let mut query = sqlx::query_as::<_, DbListing>(sql);
        if let Some(now) = now {
            query = query.bind(now.timestamp_millis());
        }
        let rows = query.bind(clamp_limit(limit)).fetch_all(&self.pool).await?;
        rows.into_iter().map(Listing::try_from).collect()
    }
}

fn clamp_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl ListingStore for SqliteListingStore {
    async fn create(&self, listing: &Listing) -> StoreResult<()> {
        listing.check_invariants()?;
        let row = DbListing::from_listing(listing)?;

        let result = sqlx::query(
            r#"
            INSERT INTO listings (id, title, summary, category, tags, price_min, price_max,
                status, capacity, intros_granted, created_at, filled_at, visible_until, views)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(row.id)
        .bind(&row.title)
        .bind(&row.summary)
        .bind(&row.category)
        .bind(&row.tags)
        .bind(row.price_min)
        .bind(row.price_max)
        .bind(&row.status)
        .bind(row.capacity)
        .bind(row.intros_granted)
        .bind(row.created_at)
        .bind(row.filled_at)
        .bind(row.visible_until)
        .bind(row.views)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Duplicate(listing.id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: &ListingId) -> StoreResult<Option<Listing>> {
        let sql = format!("SELECT {} FROM listings WHERE id = ?1", COLUMNS);
        let row = sqlx::query_as::<_, DbListing>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Listing::try_from).transpose()
    }

    async fn count_open(&self) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM listings WHERE {}", IS_OPEN);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn open_oldest_first(&self, limit: usize) -> StoreResult<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM listings WHERE {} ORDER BY created_at ASC, id ASC LIMIT ?1",
            COLUMNS, IS_OPEN
        );
        self.fetch_listings(&sql, None, limit).await
    }

    async fn closable_candidates(&self, limit: usize) -> StoreResult<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM listings WHERE {} AND intros_granted >= 1 AND capacity > 0 \
             ORDER BY created_at ASC, id ASC LIMIT ?1",
            COLUMNS, IS_OPEN
        );
        self.fetch_listings(&sql, None, limit).await
    }

    async fn visible_newest_first(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM listings WHERE {} OR ({} AND visible_until > ?1) \
             ORDER BY created_at DESC, id DESC LIMIT ?2",
            COLUMNS, IS_OPEN, IS_CLOSED
        );
        self.fetch_listings(&sql, Some(now), limit).await
    }

    async fn grant_intro(&self, id: &ListingId, allowed: u32) -> StoreResult<bool> {
        let sql = format!(
            "UPDATE listings SET intros_granted = intros_granted + 1 \
             WHERE id = ?1 AND {} AND intros_granted < capacity AND intros_granted < ?2",
            IS_OPEN
        );
        let result = sqlx::query(&sql)
            .bind(id.0)
            .bind(i64::from(allowed))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn close_if_full(
        &self,
        id: &ListingId,
        filled_at: DateTime<Utc>,
        visible_until: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let sql = format!(
            "UPDATE listings SET status = 'closed', filled_at = ?2, visible_until = ?3 \
             WHERE id = ?1 AND {} AND intros_granted >= capacity",
            IS_OPEN
        );
        let result = sqlx::query(&sql)
            .bind(id.0)
            .bind(filled_at.timestamp_millis())
            .bind(visible_until.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn bump_views(&self, id: &ListingId) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE listings SET views = views + 1 WHERE id = ?1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn census(&self, now: DateTime<Utc>) -> StoreResult<ListingCensus> {
        let sql = format!(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN {open} THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN {closed} AND visible_until > ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN {closed} AND (visible_until IS NULL OR visible_until <= ?1) THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN NOT ({open}) AND NOT ({closed}) THEN 1 ELSE 0 END), 0)
            FROM listings
            "#,
            open = IS_OPEN,
            closed = IS_CLOSED
        );
        let (open, closed_visible, closed_expired, administrative): (i64, i64, i64, i64) =
            sqlx::query_as(&sql)
                .bind(now.timestamp_millis())
                .fetch_one(&self.pool)
                .await?;

        Ok(ListingCensus {
            open: open.max(0) as u64,
            closed_visible: closed_visible.max(0) as u64,
            closed_expired: closed_expired.max(0) as u64,
            administrative: administrative.max(0) as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use listwell_types::{Category, ListingDraft, ListingStatus, PriceRange};

    async fn store() -> SqliteListingStore {
        SqliteListingStore::connect(&StoreConfig::in_memory())
            .await
            .unwrap()
    }

    fn listing_at(created_at: DateTime<Utc>, capacity: u32) -> Listing {
        Listing::open(ListingDraft {
            title: "Quarterly board deck".to_string(),
            summary: "Turn raw metrics into a narrative".to_string(),
            category: Category::Consulting,
            tags: vec!["slides".to_string()],
            price: PriceRange { min: 900, max: 1400 },
            capacity,
            created_at,
        })
        .unwrap()
    }

    fn trim_to_millis(t: DateTime<Utc>) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(t.timestamp_millis()).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = store().await;
        let listing = listing_at(trim_to_millis(Utc::now()), 3);
        store.create(&listing).await.unwrap();

        let loaded = store.get(&listing.id).await.unwrap().unwrap();
        assert_eq!(loaded, listing);
        assert!(store.get(&ListingId::new()).await.unwrap().is_none());
        assert!(matches!(
            store.create(&listing).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_grant_intro_never_exceeds_capacity() {
        let store = store().await;
        let listing = listing_at(Utc::now() - ChronoDuration::hours(60), 2);
        store.create(&listing).await.unwrap();

        assert!(store.grant_intro(&listing.id, 2).await.unwrap());
        assert!(store.grant_intro(&listing.id, 2).await.unwrap());
        assert!(!store.grant_intro(&listing.id, 2).await.unwrap());
        assert!(!store.grant_intro(&listing.id, 10).await.unwrap());

        let loaded = store.get(&listing.id).await.unwrap().unwrap();
        assert_eq!(loaded.intros_granted, 2);
    }

    #[tokio::test]
    async fn test_close_if_full_is_single_shot() {
        let store = store().await;
        let now = trim_to_millis(Utc::now());
        let listing = listing_at(now - ChronoDuration::hours(60), 1);
        store.create(&listing).await.unwrap();
        store.grant_intro(&listing.id, 1).await.unwrap();

        let until = now + ChronoDuration::hours(72);
        assert!(store.close_if_full(&listing.id, now, until).await.unwrap());
        assert!(!store.close_if_full(&listing.id, now, until).await.unwrap());
        assert!(!store.grant_intro(&listing.id, 5).await.unwrap());

        let loaded = store.get(&listing.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ListingStatus::Closed);
        assert_eq!(loaded.filled_at, Some(now));
        assert_eq!(loaded.visible_until, Some(until));
    }

    #[tokio::test]
    async fn test_mixed_case_statuses_are_translated_at_the_edge() {
        let store = store().await;
        let now = Utc::now();
        let upper = listing_at(now - ChronoDuration::hours(3), 3);
        let staged = listing_at(now - ChronoDuration::hours(2), 3);
        store.create(&upper).await.unwrap();
        store.create(&staged).await.unwrap();

        sqlx::query("UPDATE listings SET status = 'OPEN' WHERE id = ?1")
            .bind(upper.id.0)
            .execute(store.pool())
            .await
            .unwrap();
        sqlx::query("UPDATE listings SET status = 'Stage-Review' WHERE id = ?1")
            .bind(staged.id.0)
            .execute(store.pool())
            .await
            .unwrap();

        assert_eq!(store.count_open().await.unwrap(), 1);
        let open = store.open_oldest_first(10).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].status, ListingStatus::Open);
        assert!(!store.grant_intro(&staged.id, 3).await.unwrap());

        let census = store.census(now).await.unwrap();
        assert_eq!(census.open, 1);
        assert_eq!(census.administrative, 1);
    }

    #[tokio::test]
    async fn test_visibility_window_edges() {
        let store = store().await;
        let now = trim_to_millis(Utc::now());
        let listing = listing_at(now - ChronoDuration::hours(60), 1);
        store.create(&listing).await.unwrap();
        store.grant_intro(&listing.id, 1).await.unwrap();
        let until = now + ChronoDuration::hours(72);
        store.close_if_full(&listing.id, now, until).await.unwrap();

        let before = store
            .visible_newest_first(until - ChronoDuration::minutes(1), 10)
            .await
            .unwrap();
        assert_eq!(before.len(), 1);

        let after = store
            .visible_newest_first(until + ChronoDuration::minutes(1), 10)
            .await
            .unwrap();
        assert!(after.is_empty());

        let census = store.census(until + ChronoDuration::minutes(1)).await.unwrap();
        assert_eq!(census.closed_expired, 1);
    }

    #[tokio::test]
    async fn test_ordering_and_views() {
        let store = store().await;
        let now = Utc::now();
        let old = listing_at(now - ChronoDuration::hours(10), 3);
        let new = listing_at(now - ChronoDuration::hours(1), 3);
        store.create(&new).await.unwrap();
        store.create(&old).await.unwrap();

        let oldest = store.open_oldest_first(1).await.unwrap();
        assert_eq!(oldest[0].id, old.id);
        let newest = store.visible_newest_first(now, 1).await.unwrap();
        assert_eq!(newest[0].id, new.id);

        assert!(store.bump_views(&new.id).await.unwrap());
        assert!(store.bump_views(&new.id).await.unwrap());
        assert!(!store.bump_views(&ListingId::new()).await.unwrap());
        assert_eq!(store.get(&new.id).await.unwrap().unwrap().views, 2);
    }
}
