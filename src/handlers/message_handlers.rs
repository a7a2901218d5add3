use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use sqlx::PgPool;

use crate::audit::{self, OriginIp, actions};
use crate::auth::capabilities::Capability;
use crate::auth::session::actor;
use crate::errors::AppError;
use crate::models::message::{self, MessageForm, MessageInbox, RECENT_LIMIT};
use crate::models::user;
use crate::responses::{ApiMessage, CreatedResponse};

/// GET /api/v1/messages - latest broadcasts and how many the caller has not read.
pub async fn list(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let (user_id, _, _) = actor(&session, Capability::View)?;
    let profile = user::find_by_id(&pool, user_id).await?.ok_or(AppError::Unauthorized)?;

    let messages = message::find_recent(&pool, RECENT_LIMIT).await?;
    let unread = message::unread_count(&messages, profile.last_read_message_id);
    Ok(HttpResponse::Ok().json(MessageInbox { messages, unread }))
}

pub async fn send(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    body: web::Json<MessageForm>,
) -> Result<HttpResponse, AppError> {
    let (_, email, _) = actor(&session, Capability::Admin)?;
    let text = body.validate().map_err(AppError::Validation)?;

    let id = message::create(&pool, &text, &email).await?;
    audit::record(&pool, &origin, &req, &email, actions::MESSAGE_SEND, &text).await;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// POST /api/v1/messages/read - mark everything up to the newest message as read.
pub async fn mark_read(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let (user_id, _, _) = actor(&session, Capability::View)?;

    if let Some(latest) = message::latest_id(&pool).await? {
        user::mark_messages_read(&pool, user_id, latest).await?;
    }
    Ok(HttpResponse::Ok().json(ApiMessage::new("Avisos marcados como lidos")))
}
