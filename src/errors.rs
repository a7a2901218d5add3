use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;

use crate::responses::ApiErrorResponse;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Http(reqwest::Error),
    Json(serde_json::Error),
    Hash(String),
    Session(String),
    Unauthorized,
    InvalidCredentials,
    PendingApproval,
    PermissionDenied(String),
    NotFound,
    Validation(Vec<String>),
    Conflict(String),
    Upstream(String),
    UndoExpired(i64),
    RateLimited,
}

impl AppError {
    /// Map a failed write: unique violations become `Conflict(message)`, the rest stay `Db`.
    pub fn from_write(e: sqlx::Error, conflict_message: impl Into<String>) -> Self {
        let unique = e
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);
        if unique {
            AppError::Conflict(conflict_message.into())
        } else {
            AppError::Db(e)
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Db(_) | AppError::Http(_) | AppError::Json(_) | AppError::Hash(_) | AppError::Session(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Http(e) => write!(f, "HTTP client error: {e}"),
            AppError::Json(e) => write!(f, "JSON error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::Unauthorized => write!(f, "Not logged in"),
            AppError::InvalidCredentials => write!(f, "Email ou senha inválidos"),
            AppError::PendingApproval => write!(f, "Account awaiting administrator approval"),
            AppError::PermissionDenied(what) => write!(f, "Permission denied: {what}"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join("; ")),
            AppError::Conflict(msg) => write!(f, "{msg}"),
            AppError::Upstream(msg) => write!(f, "{msg}"),
            AppError::UndoExpired(minutes) => {
                write!(f, "O prazo de {minutes} minutos para desfazer esta importação expirou.")
            }
            AppError::RateLimited => write!(f, "Too many failed login attempts. Please try again later."),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::PendingApproval | AppError::PermissionDenied(_) | AppError::UndoExpired(_) => {
                StatusCode::FORBIDDEN
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = if self.is_internal() {
            log::error!("{self}");
            ApiErrorResponse {
                error: "Internal Server Error".to_string(),
                details: None,
            }
        } else {
            let details = match self {
                AppError::Validation(errors) => Some(errors.join("; ")),
                _ => None,
            };
            ApiErrorResponse {
                error: self.to_string(),
                details,
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Http(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Json(e)
    }
}
