use actix_session::Session;

use super::capabilities::{Capabilities, Capability};
use crate::errors::AppError;
use crate::models::user::UserProfile;

const USER_ID: &str = "user_id";
const EMAIL: &str = "email";
const CAPABILITIES: &str = "capabilities";

/// Store the logged-in user and their resolved capabilities.
pub fn establish(session: &Session, user: &UserProfile) -> Result<Capabilities, AppError> {
    let caps = Capabilities::resolve(user.role, user.approved);
    session.renew();
    session
        .insert(USER_ID, user.id)
        .and_then(|_| session.insert(EMAIL, &user.email))
        .and_then(|_| session.insert(CAPABILITIES, caps.to_csv()))
        .map_err(|e| AppError::Session(e.to_string()))?;
    Ok(caps)
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>(USER_ID).unwrap_or(None)
}

pub fn get_email(session: &Session) -> Result<String, AppError> {
    match session.get::<String>(EMAIL) {
        Ok(Some(email)) => Ok(email),
        Ok(None) => Err(AppError::Unauthorized),
        Err(e) => Err(AppError::Session(e.to_string())),
    }
}

pub fn get_capabilities(session: &Session) -> Result<Capabilities, AppError> {
    match session.get::<String>(CAPABILITIES) {
        Ok(Some(csv)) => Ok(Capabilities::from_csv(&csv)),
        Ok(None) => Err(AppError::Unauthorized),
        Err(e) => Err(AppError::Session(e.to_string())),
    }
}

/// Check the session for `capability`, distinguishing pending accounts from plain denials.
pub fn require(session: &Session, capability: Capability) -> Result<Capabilities, AppError> {
    if get_user_id(session).is_none() {
        return Err(AppError::Unauthorized);
    }
    let caps = get_capabilities(session)?;
    check(caps, capability)?;
    Ok(caps)
}

/// The user id and email of a session already known to hold `capability`.
pub fn actor(session: &Session, capability: Capability) -> Result<(i64, String, Capabilities), AppError> {
    let caps = require(session, capability)?;
    let id = get_user_id(session).ok_or(AppError::Unauthorized)?;
    let email = get_email(session)?;
    Ok((id, email, caps))
}

pub fn check(caps: Capabilities, capability: Capability) -> Result<(), AppError> {
    if caps.is_empty() {
        Err(AppError::PendingApproval)
    } else if caps.has(capability) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(capability.code().to_string()))
    }
}
