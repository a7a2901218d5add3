pub mod filter;
pub mod origin_ip;

use actix_web::HttpRequest;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

pub use filter::LogFilter;
pub use origin_ip::OriginIp;

/// How many entries the audit screen loads.
pub const RECENT_LIMIT: i64 = 100;

/// Action labels as shown in the audit screen.
pub mod actions {
    pub const APPOINTMENT_CREATE: &str = "NOVA PERÍCIA";
    pub const APPOINTMENT_EDIT: &str = "EDIÇÃO PERÍCIA";
    pub const APPOINTMENT_DELETE: &str = "EXCLUSÃO PERÍCIA";
    pub const ATTENDANCE_CREATE: &str = "CRIAÇÃO PRESENÇA";
    pub const ATTENDANCE_UPDATE: &str = "UPDATE PRESENÇA";
    pub const ATTENDANCE_DELETE: &str = "EXCLUSÃO PRESENÇA";
    pub const ATTENDANCE_PUNCH: &str = "PONTO RÁPIDO";
    pub const IMPORT_UPLOAD: &str = "UPLOAD PAUTA";
    pub const IMPORT_UNDO: &str = "DESFAZER UPLOAD";
    pub const MESSAGE_SEND: &str = "AVISO GLOBAL";
    pub const USER_UPDATE: &str = "USUÁRIO ATUALIZADO";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct LogEntry {
    pub id: i64,
    pub user_email: String,
    pub action: String,
    pub details: String,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
}

/// Append one entry to `system_logs`.
pub async fn log(
    pool: &PgPool,
    user_email: &str,
    action: &str,
    details: &str,
    ip_address: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO system_logs (user_email, action, details, ip_address) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_email)
    .bind(action)
    .bind(details)
    .bind(ip_address)
    .execute(pool)
    .await?;
    Ok(())
}

/// Log an action performed through `req`. Audit failures never fail the request.
pub async fn record(
    pool: &PgPool,
    origin: &OriginIp,
    req: &HttpRequest,
    user_email: &str,
    action: &str,
    details: &str,
) {
    let ip = match client_ip(req) {
        Some(ip) => ip,
        None => origin.resolve().await,
    };
    if let Err(e) = log(pool, user_email, action, details, &ip).await {
        log::warn!("Failed to write audit entry '{action}' for {user_email}: {e}");
    }
}

/// Caller address: first `X-Forwarded-For` hop, else the socket peer.
pub fn client_ip(req: &HttpRequest) -> Option<String> {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from);

    forwarded.or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
}

pub async fn find_recent(pool: &PgPool, limit: i64) -> Result<Vec<LogEntry>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, user_email, action, COALESCE(details, '') AS details, \
                COALESCE(ip_address, '') AS ip_address, created_at \
         FROM system_logs ORDER BY created_at DESC, id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Delete entries older than the retention period. Returns how many were removed.
pub async fn cleanup_old_entries(pool: &PgPool, retention_days: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM system_logs WHERE created_at < NOW() - make_interval(days => $1::int)",
    )
    .bind(retention_days)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
