//! Catalog access: SQLite-backed restaurant store plus an atomically
//! swappable in-memory snapshot.
//!
//! The store belongs to an external admin surface; the engine only ever
//! reads. Rows are loaded in id order, which is the insertion order the
//! ranker's tie-break relies on.

use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::Restaurant;

/// Errors that can occur when reading the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

/// SQLite-backed restaurant store
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    /// Open the catalog database, creating the file and schema when the
    /// database does not exist yet.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, CatalogError> {
        let options: SqliteConnectOptions = database_url
            .parse::<SqliteConnectOptions>()?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<(), CatalogError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS restaurants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name_en TEXT,
                name_zh TEXT,
                address_en TEXT,
                address_zh TEXT,
                district_en TEXT,
                district_zh TEXT,
                cuisine_en TEXT,
                cuisine_zh TEXT,
                price TEXT,
                phone TEXT,
                opening_hours_en TEXT,
                opening_hours_zh TEXT,
                rating_smile TEXT,
                rating_ok TEXT,
                rating_cry TEXT,
                description_en TEXT,
                description_zh TEXT,
                popular_dishes_en TEXT,
                popular_dishes_zh TEXT,
                url TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Load the full catalog in insertion order.
    pub async fn load_all(&self) -> Result<Vec<Restaurant>, CatalogError> {
        let restaurants = sqlx::query_as::<_, Restaurant>(
            "SELECT * FROM restaurants ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("Loaded {} restaurants from catalog", restaurants.len());
        Ok(restaurants)
    }

    pub async fn health_check(&self) -> Result<bool, CatalogError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }
}

/// Read-only catalog snapshot shared across requests.
///
/// Refresh builds a complete new vector and swaps the `Arc` under a short
/// write lock, so concurrent ranking passes either see the old snapshot
/// or the new one, never a half-updated catalog.
pub struct CatalogCache {
    store: CatalogStore,
    snapshot: RwLock<Arc<Vec<Restaurant>>>,
}

impl CatalogCache {
    /// Wrap the store, loading the initial snapshot.
    pub async fn new(store: CatalogStore) -> Result<Self, CatalogError> {
        let initial = store.load_all().await?;
        tracing::info!("Catalog snapshot loaded: {} restaurants", initial.len());
        Ok(Self {
            store,
            snapshot: RwLock::new(Arc::new(initial)),
        })
    }

    /// Cheap handle to the current snapshot.
    pub async fn snapshot(&self) -> Arc<Vec<Restaurant>> {
        self.snapshot.read().await.clone()
    }

    /// Atomic full replace of the snapshot from the store.
    pub async fn refresh(&self) -> Result<usize, CatalogError> {
        let fresh = self.store.load_all().await?;
        let count = fresh.len();
        *self.snapshot.write().await = Arc::new(fresh);
        tracing::info!("Catalog snapshot refreshed: {} restaurants", count);
        Ok(count)
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }
}
