use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access level stored on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    /// Unknown role text degrades to `Viewer`.
    pub fn parse(s: &str) -> Role {
        match s.trim().to_lowercase().as_str() {
            "admin" => Role::Admin,
            "editor" => Role::Editor,
            _ => Role::Viewer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile as shown to clients. Never includes the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub approved: bool,
    pub last_read_message_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Internal row including the password hash, used for authentication.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub approved: bool,
    pub password: String,
    pub last_read_message_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        UserProfile {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            role: Role::parse(&row.role),
            approved: row.approved,
            last_read_message_id: row.last_read_message_id,
            created_at: row.created_at,
        }
    }
}

/// New profile data for creation. `password` is already hashed.
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: Role,
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Admin change of role and/or approval.
#[derive(Debug, Default, Deserialize)]
pub struct AccessUpdate {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub approved: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetForm {
    pub password: String,
}
