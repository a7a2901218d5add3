use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";
const DEFAULT_FETCH_LIMIT: i64 = 5000;
const DEFAULT_AUDIT_RETENTION_DAYS: i64 = 365;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration, read once at start-up from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub session_key: Option<String>,
    pub import_webhook_url: Option<String>,
    pub legacy_sheet_url: Option<String>,
    pub ip_lookup_url: Option<String>,
    pub appointment_fetch_limit: i64,
    pub audit_retention_days: i64,
    pub max_upload_bytes: usize,
    pub http_timeout: Duration,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Config {
            database_url,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            session_key: optional("SESSION_KEY"),
            import_webhook_url: optional("IMPORT_WEBHOOK_URL"),
            legacy_sheet_url: optional("LEGACY_SHEET_URL"),
            ip_lookup_url: match env::var("IP_LOOKUP_URL") {
                // An explicitly empty value disables the lookup.
                Ok(v) if v.trim().is_empty() => None,
                Ok(v) => Some(v),
                Err(_) => Some(DEFAULT_IP_LOOKUP_URL.to_string()),
            },
            appointment_fetch_limit: number("APPOINTMENT_FETCH_LIMIT", DEFAULT_FETCH_LIMIT),
            audit_retention_days: number("AUDIT_RETENTION_DAYS", DEFAULT_AUDIT_RETENTION_DAYS),
            max_upload_bytes: number("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            http_timeout: Duration::from_secs(number("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)),
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }

    /// Shared outbound HTTP client for the pipeline, the legacy sheet and the IP lookup.
    pub fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Failed to build HTTP client with timeout ({e}), using defaults");
                reqwest::Client::new()
            })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn number<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match optional(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("{key}={raw} is not a valid number, using {default}");
            default
        }),
        None => default,
    }
}
