use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::validate;

/// How many broadcast messages the notification panel shows.
pub const RECENT_LIMIT: i64 = 50;
const MAX_MESSAGE_LEN: usize = 2000;

/// Append-only broadcast notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct GlobalMessage {
    pub id: i64,
    pub message: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub message: String,
}

impl MessageForm {
    pub fn validate(&self) -> Result<String, Vec<String>> {
        match validate::validate_required(&self.message, "Mensagem", MAX_MESSAGE_LEN) {
            Some(e) => Err(vec![e]),
            None => Ok(self.message.trim().to_string()),
        }
    }
}

/// Messages plus the reader's unread count.
#[derive(Debug, Clone, Serialize)]
pub struct MessageInbox {
    pub messages: Vec<GlobalMessage>,
    pub unread: usize,
}

/// Messages newer than the reader's last-read marker.
pub fn unread_count(messages: &[GlobalMessage], last_read_id: i64) -> usize {
    messages.iter().filter(|m| m.id > last_read_id).count()
}

pub async fn create(pool: &PgPool, message: &str, created_by: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO global_messages (message, created_by) VALUES ($1, $2) RETURNING id",
    )
    .bind(message)
    .bind(created_by)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<GlobalMessage>, sqlx::Error> {
    sqlx::query_as("SELECT id, message, created_by, created_at FROM global_messages WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Latest messages, newest first.
pub async fn find_recent(pool: &PgPool, limit: i64) -> Result<Vec<GlobalMessage>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, message, created_by, created_at FROM global_messages \
         ORDER BY created_at DESC, id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Id of the newest message, if any exist.
pub async fn latest_id(pool: &PgPool) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT MAX(id) FROM global_messages")
        .fetch_one(pool)
        .await
}
