use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::{self, LogEntry, LogFilter, OriginIp, actions, filter::unique_actions};
use crate::auth::capabilities::Capability;
use crate::auth::session::{actor, require};
use crate::auth::{password, validate};
use crate::errors::AppError;
use crate::models::user::{self, AccessUpdate, PasswordResetForm, Role, UserProfile};
use crate::responses::ApiMessage;

#[derive(Debug, Default, Deserialize)]
pub struct UserSearch {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct LogListResponse {
    pub entries: Vec<LogEntry>,
    pub actions: Vec<String>,
}

/// True when applying `update` would leave `target` without admin access.
pub fn removes_admin(target: &UserProfile, update: &AccessUpdate) -> bool {
    let is_admin = target.role == Role::Admin && target.approved;
    let demoted = update.role.is_some_and(|r| r != Role::Admin);
    let revoked = update.approved == Some(false);
    is_admin && (demoted || revoked)
}

/// Reject changes that would lock the administrators out.
pub fn check_access_change(
    actor_id: i64,
    target: &UserProfile,
    update: &AccessUpdate,
    admin_count: i64,
) -> Result<(), AppError> {
    if update.role.is_none() && update.approved.is_none() {
        return Err(AppError::validation("Nada para atualizar"));
    }
    if !removes_admin(target, update) {
        return Ok(());
    }
    if target.id == actor_id {
        return Err(AppError::validation(
            "Você não pode remover seu próprio acesso de administrador",
        ));
    }
    if admin_count <= 1 {
        return Err(AppError::validation("Não é possível remover o último administrador"));
    }
    Ok(())
}

/// GET /api/v1/admin/users?q=
pub async fn list_users(
    pool: web::Data<PgPool>,
    session: Session,
    query: web::Query<UserSearch>,
) -> Result<HttpResponse, AppError> {
    require(&session, Capability::Admin)?;
    let users = user::find_all(&pool, Some(query.q.as_str())).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// PUT /api/v1/admin/users/{id} - change role and/or approval.
pub async fn update_access(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    path: web::Path<i64>,
    body: web::Json<AccessUpdate>,
) -> Result<HttpResponse, AppError> {
    let (actor_id, email, _) = actor(&session, Capability::Admin)?;
    let target_id = path.into_inner();
    let target = user::find_by_id(&pool, target_id).await?.ok_or(AppError::NotFound)?;

    let admin_count = user::count_admins(&pool).await?;
    check_access_change(actor_id, &target, &body, admin_count)?;

    if !user::update_access(&pool, target_id, body.role, body.approved).await? {
        return Err(AppError::NotFound);
    }

    let mut changes = vec![];
    if let Some(role) = body.role {
        changes.push(format!("papel {} -> {role}", target.role));
    }
    if let Some(approved) = body.approved {
        changes.push(if approved { "aprovado".to_string() } else { "acesso revogado".to_string() });
    }
    let details = format!("{}: {}", target.email, changes.join(", "));
    audit::record(&pool, &origin, &req, &email, actions::USER_UPDATE, &details).await;

    Ok(HttpResponse::Ok().json(ApiMessage::new("Usuário atualizado")))
}

/// PUT /api/v1/admin/users/{id}/password
pub async fn reset_password(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    path: web::Path<i64>,
    body: web::Json<PasswordResetForm>,
) -> Result<HttpResponse, AppError> {
    let (_, email, _) = actor(&session, Capability::Admin)?;
    let target_id = path.into_inner();

    if let Some(e) = validate::validate_password(&body.password) {
        return Err(AppError::Validation(vec![e]));
    }
    let target = user::find_by_id(&pool, target_id).await?.ok_or(AppError::NotFound)?;
    let hashed = password::hash_password(&body.password)?;
    if !user::set_password(&pool, target_id, &hashed).await? {
        return Err(AppError::NotFound);
    }

    let details = format!("Senha redefinida para {}", target.email);
    audit::record(&pool, &origin, &req, &email, actions::USER_UPDATE, &details).await;

    Ok(HttpResponse::Ok().json(ApiMessage::new("Senha redefinida")))
}

/// GET /api/v1/admin/logs?q=&action=&date=
pub async fn logs(
    pool: web::Data<PgPool>,
    session: Session,
    query: web::Query<LogFilter>,
) -> Result<HttpResponse, AppError> {
    require(&session, Capability::Admin)?;
    let all = audit::find_recent(&pool, audit::RECENT_LIMIT).await?;
    let actions = unique_actions(&all);
    let entries = query.apply(all);
    Ok(HttpResponse::Ok().json(LogListResponse { entries, actions }))
}
