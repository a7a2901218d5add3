use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use sqlx::PgPool;
use std::net::{IpAddr, Ipv4Addr};

use crate::auth::capabilities::Capabilities;
use crate::auth::session::{self, get_capabilities, get_user_id};
use crate::auth::{password, rate_limit::RateLimiter, validate};
use crate::errors::AppError;
use crate::models::user::{self, LoginForm, NewUser, Role, SignupForm, UserProfile};
use crate::responses::{ApiMessage, CreatedResponse, MeResponse};

/// POST /api/v1/auth/signup - self-service registration; the account awaits approval.
pub async fn signup(
    pool: web::Data<PgPool>,
    body: web::Json<SignupForm>,
) -> Result<HttpResponse, AppError> {
    let mut errors = vec![];
    errors.extend(validate::validate_email(&body.email));
    errors.extend(validate::validate_password(&body.password));
    errors.extend(validate::validate_optional(&body.full_name, "Nome", 200));
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let hashed = password::hash_password(&body.password)?;
    let new_user = NewUser {
        email: body.email.trim().to_lowercase(),
        full_name: body.full_name.trim().to_string(),
        password: hashed,
        role: Role::Viewer,
        approved: false,
    };
    let id = user::create(&pool, &new_user)
        .await
        .map_err(|e| AppError::from_write(e, "Email já cadastrado"))?;

    log::info!("New account {} awaiting approval", new_user.email);
    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

pub async fn login(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    limiter: web::Data<RateLimiter>,
    body: web::Json<LoginForm>,
) -> Result<HttpResponse, AppError> {
    // Rate-limit check BEFORE any database access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        return Err(AppError::RateLimited);
    }

    let found = user::find_by_email(&pool, &body.email).await?;
    let verified = match &found {
        Some(row) => password::verify_password(&body.password, &row.password)?,
        None => false,
    };
    let row = match found {
        Some(row) if verified => row,
        _ => {
            limiter.record_failure(ip);
            return Err(AppError::InvalidCredentials);
        }
    };

    limiter.clear(ip);
    let profile = UserProfile::from(row);
    let capabilities = session::establish(&session, &profile)?;
    log::info!("{} logged in as {}", profile.email, profile.role);

    Ok(HttpResponse::Ok().json(MeResponse { profile, capabilities }))
}

pub async fn logout(session: Session) -> Result<HttpResponse, AppError> {
    session.purge();
    Ok(HttpResponse::Ok().json(ApiMessage::new("Sessão encerrada")))
}

async fn current_profile(pool: &PgPool, session: &Session) -> Result<UserProfile, AppError> {
    let id = get_user_id(session).ok_or(AppError::Unauthorized)?;
    user::find_by_id(pool, id).await?.ok_or(AppError::Unauthorized)
}

/// GET /api/v1/me - profile plus the capabilities fixed at login.
pub async fn me(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let profile = current_profile(&pool, &session).await?;
    let capabilities = get_capabilities(&session)?;
    Ok(HttpResponse::Ok().json(MeResponse { profile, capabilities }))
}

/// POST /api/v1/auth/refresh - re-read role and approval, e.g. after an admin approved the account.
pub async fn refresh(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let profile = current_profile(&pool, &session).await?;
    let before = get_capabilities(&session).unwrap_or_default();
    let capabilities: Capabilities = session::establish(&session, &profile)?;
    if before != capabilities {
        log::info!("Capabilities of {} changed to [{}]", profile.email, capabilities.to_csv());
    }
    Ok(HttpResponse::Ok().json(MeResponse { profile, capabilities }))
}
