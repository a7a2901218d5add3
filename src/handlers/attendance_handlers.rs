use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Local;
use sqlx::PgPool;

use crate::audit::{self, OriginIp, actions};
use crate::auth::capabilities::Capability;
use crate::auth::session::{actor, require};
use crate::errors::AppError;
use crate::models::attendance::{self, AttendanceForm, AttendanceView, PunchForm};
use crate::responses::{ApiMessage, CreatedResponse};

/// GET /api/v1/attendance - newest first, with computed durations.
pub async fn list(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    require(&session, Capability::View)?;
    let records: Vec<AttendanceView> = attendance::find_all(&pool)
        .await?
        .into_iter()
        .map(AttendanceView::from)
        .collect();
    Ok(HttpResponse::Ok().json(records))
}

pub async fn create(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    body: web::Json<AttendanceForm>,
) -> Result<HttpResponse, AppError> {
    let (_, email, _) = actor(&session, Capability::Edit)?;
    let input = body.validate().map_err(AppError::Validation)?;

    let id = attendance::create(&pool, &input).await?;

    let details = format!("{} em {} ({} / {})", input.perito, input.data_pericia, input.vara, input.sala);
    audit::record(&pool, &origin, &req, &email, actions::ATTENDANCE_CREATE, &details).await;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

pub async fn update(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    path: web::Path<i64>,
    body: web::Json<AttendanceForm>,
) -> Result<HttpResponse, AppError> {
    let (_, email, _) = actor(&session, Capability::Edit)?;
    let id = path.into_inner();
    let input = body.validate().map_err(AppError::Validation)?;

    if !attendance::update(&pool, id, &input).await? {
        return Err(AppError::NotFound);
    }

    let details = format!("Registro {id}: {} em {}", input.perito, input.data_pericia);
    audit::record(&pool, &origin, &req, &email, actions::ATTENDANCE_UPDATE, &details).await;

    Ok(HttpResponse::Ok().json(ApiMessage::new("Registro atualizado")))
}

pub async fn delete(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let (_, email, _) = actor(&session, Capability::Edit)?;
    let id = path.into_inner();
    let record = attendance::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;

    if !attendance::delete(&pool, id).await? {
        return Err(AppError::NotFound);
    }

    let details = format!("Registro {id}: {} em {}", record.perito, record.data_pericia);
    audit::record(&pool, &origin, &req, &email, actions::ATTENDANCE_DELETE, &details).await;

    Ok(HttpResponse::Ok().json(ApiMessage::new("Registro excluído")))
}

/// POST /api/v1/attendance/{id}/punch - stamp arrival or departure with the current local time.
pub async fn punch(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    path: web::Path<i64>,
    body: web::Json<PunchForm>,
) -> Result<HttpResponse, AppError> {
    let (_, email, _) = actor(&session, Capability::Edit)?;
    let id = path.into_inner();
    let now = Local::now().format("%H:%M").to_string();

    if !attendance::set_time(&pool, id, body.field, &now).await? {
        return Err(AppError::NotFound);
    }

    let record = attendance::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    let details = format!("Registro {id}: {} = {now}", body.field.column());
    audit::record(&pool, &origin, &req, &email, actions::ATTENDANCE_PUNCH, &details).await;

    Ok(HttpResponse::Ok().json(AttendanceView::from(record)))
}
