//! Fire-and-forget search-history sink.
//!
//! Each ranking call records what was asked and how many results came
//! back. Logging failures are reported at warn level and never propagate
//! into the ranking call itself.

use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::Language;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

/// One logged search
#[derive(Debug, Clone)]
pub struct SearchRecord {
    pub preferences: String,
    /// Comma-joined cuisine tokens from the analysis, if any.
    pub cuisine: Option<String>,
    pub district: String,
    pub budget: String,
    pub results_count: usize,
    pub language: Language,
    pub session_id: String,
}

/// Search-history sink backed by the same SQLite file as the catalog.
#[derive(Clone)]
pub struct SearchLogger {
    pool: SqlitePool,
}

impl SearchLogger {
    pub async fn new(pool: SqlitePool) -> Result<Self, HistoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS search_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
                preferences TEXT,
                cuisine TEXT,
                district TEXT,
                budget TEXT,
                results_count INTEGER,
                language TEXT,
                session_id TEXT
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Insert one search record.
    pub async fn log(&self, record: SearchRecord) -> Result<(), HistoryError> {
        let language = match record.language {
            Language::En => "en",
            Language::Zh => "zh",
        };

        sqlx::query(
            r#"
            INSERT INTO search_history
                (preferences, cuisine, district, budget, results_count, language, session_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.preferences)
        .bind(&record.cuisine)
        .bind(&record.district)
        .bind(&record.budget)
        .bind(record.results_count as i64)
        .bind(language)
        .bind(&record.session_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Detached logging for request handlers: spawn, warn on failure.
    pub fn log_detached(&self, record: SearchRecord) {
        let logger = self.clone();
        tokio::spawn(async move {
            if let Err(e) = logger.log(record).await {
                tracing::warn!("Failed to log search history: {}", e);
            }
        });
    }
}
