use serde::Serialize;

use crate::auth::capabilities::Capabilities;
use crate::models::appointment::Rejected;
use crate::models::user::UserProfile;

/// Error body for every failed API call.
#[derive(Serialize, Debug, Clone)]
pub struct ApiErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

/// Plain message body, e.g. for successful actions that return no entity.
#[derive(Serialize, Debug, Clone)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        ApiMessage { message: message.into() }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Serialize, Debug, Clone)]
pub struct QuarantineResponse {
    pub items: Vec<Rejected>,
}

/// Current session user.
#[derive(Serialize, Debug, Clone)]
pub struct MeResponse {
    pub profile: UserProfile,
    pub capabilities: Capabilities,
}
