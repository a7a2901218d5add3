use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// How many recent uploads a user sees (and that are checked for duplicate files).
pub const HISTORY_LIMIT: i64 = 5;

/// One bulk import, identified by the batch id the pipeline tags its rows with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ImportBatch {
    pub batch_id: String,
    pub file_name: String,
    pub uploaded_by: i64,
    pub created_at: DateTime<Utc>,
}

impl ImportBatch {
    /// Undo is allowed while the batch is younger than `window`.
    pub fn undo_allowed(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.created_at <= window
    }
}

/// Fresh batch identifier (random UUID v4).
pub fn generate_batch_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// True when the same file name is already among the recent uploads.
pub fn is_recent_duplicate(recent: &[ImportBatch], file_name: &str) -> bool {
    recent.iter().any(|b| b.file_name == file_name)
}

pub async fn record(
    pool: &PgPool,
    batch_id: &str,
    file_name: &str,
    uploaded_by: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO import_batches (batch_id, file_name, uploaded_by) VALUES ($1, $2, $3)",
    )
    .bind(batch_id)
    .bind(file_name)
    .bind(uploaded_by)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find(pool: &PgPool, batch_id: &str) -> Result<Option<ImportBatch>, sqlx::Error> {
    sqlx::query_as(
        "SELECT batch_id, file_name, uploaded_by, created_at FROM import_batches WHERE batch_id = $1",
    )
    .bind(batch_id)
    .fetch_optional(pool)
    .await
}

/// The user's most recent uploads, newest first.
pub async fn find_recent_for_user(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<ImportBatch>, sqlx::Error> {
    sqlx::query_as(
        "SELECT batch_id, file_name, uploaded_by, created_at FROM import_batches \
         WHERE uploaded_by = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn remove(pool: &PgPool, batch_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM import_batches WHERE batch_id = $1")
        .bind(batch_id)
        .execute(pool)
        .await?;
    Ok(())
}
