use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use sqlx::PgPool;

use crate::audit::{self, OriginIp, actions};
use crate::auth::capabilities::Capability;
use crate::auth::session::{actor, require};
use crate::errors::AppError;
use crate::models::appointment::normalize::{normalize_outcome, normalize_text, prepare_new};
use crate::models::appointment::{self, Appointment, AppointmentFilter, AppointmentUpdate, NewAppointment};
use crate::responses::{ApiMessage, CreatedResponse, QuarantineResponse};
use crate::snapshot::AppointmentSnapshot;

fn duplicate_message(examinee: &str, date: &str) -> String {
    format!("O periciado \"{examinee}\" já está cadastrado para o dia {date}.")
}

/// GET /api/v1/appointments - filtered rows, stats and selector lists.
pub async fn list(
    session: Session,
    snapshot: web::Data<AppointmentSnapshot>,
    query: web::Query<AppointmentFilter>,
) -> Result<HttpResponse, AppError> {
    require(&session, Capability::View)?;
    Ok(HttpResponse::Ok().json(snapshot.filtered(&query)))
}

/// GET /api/v1/appointments/quarantine - rows that could not be normalized.
pub async fn quarantine(
    session: Session,
    snapshot: web::Data<AppointmentSnapshot>,
) -> Result<HttpResponse, AppError> {
    require(&session, Capability::Admin)?;
    Ok(HttpResponse::Ok().json(QuarantineResponse {
        items: snapshot.quarantine(),
    }))
}

pub async fn create(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    snapshot: web::Data<AppointmentSnapshot>,
    body: web::Json<NewAppointment>,
) -> Result<HttpResponse, AppError> {
    let (_, email, _) = actor(&session, Capability::Edit)?;
    let new = prepare_new(&body).map_err(AppError::Validation)?;

    let id = appointment::create(&pool, &new)
        .await
        .map_err(|e| AppError::from_write(e, duplicate_message(&new.examinee, &new.date)))?;

    snapshot.insert(Appointment {
        id,
        date: new.date.clone(),
        expert: new.expert.clone(),
        specialty: new.specialty.clone(),
        examinee: new.examinee.clone(),
        outcome: String::new(),
        batch_id: None,
    });
    snapshot.spawn_refresh(pool.get_ref().clone());

    let details = format!("Periciado: {}, Data: {}, Perito: {}", new.examinee, new.date, new.expert);
    audit::record(&pool, &origin, &req, &email, actions::APPOINTMENT_CREATE, &details).await;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// PUT /api/v1/appointments/{id} - set the outcome and/or correct the examinee name.
pub async fn update(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    snapshot: web::Data<AppointmentSnapshot>,
    path: web::Path<i64>,
    body: web::Json<AppointmentUpdate>,
) -> Result<HttpResponse, AppError> {
    let (_, email, _) = actor(&session, Capability::Edit)?;
    let id = path.into_inner();

    let outcome = match body.outcome.as_deref() {
        Some(raw) => Some(normalize_outcome(raw).map_err(|e| AppError::validation(e.to_string()))?),
        None => None,
    };
    let examinee = match body.examinee.as_deref() {
        Some(raw) if raw.trim().is_empty() => {
            return Err(AppError::validation("Periciado não pode ficar em branco"));
        }
        Some(raw) => Some(normalize_text(raw)),
        None => None,
    };
    if outcome.is_none() && examinee.is_none() {
        return Err(AppError::validation("Nada para atualizar"));
    }

    let before = snapshot.get(id);
    let conflict_date = before.as_ref().map(|a| a.date.clone()).unwrap_or_default();
    let conflict_name = examinee.clone().unwrap_or_default();

    let updated = appointment::update(&pool, id, outcome.as_deref(), examinee.as_deref())
        .await
        .map_err(|e| AppError::from_write(e, duplicate_message(&conflict_name, &conflict_date)))?;
    if !updated {
        return Err(AppError::NotFound);
    }

    snapshot.update(id, |a| {
        if let Some(o) = &outcome {
            a.outcome = o.clone();
        }
        if let Some(n) = &examinee {
            a.examinee = n.clone();
        }
    });
    snapshot.spawn_refresh(pool.get_ref().clone());

    let mut changes = vec![];
    if let Some(o) = &outcome {
        let old = before.as_ref().map(|a| a.outcome.as_str()).unwrap_or("?");
        changes.push(format!("status '{old}' -> '{o}'"));
    }
    if let Some(n) = &examinee {
        let old = before.as_ref().map(|a| a.examinee.as_str()).unwrap_or("?");
        changes.push(format!("periciado '{old}' -> '{n}'"));
    }
    let details = format!("Perícia {id}: {}", changes.join("; "));
    audit::record(&pool, &origin, &req, &email, actions::APPOINTMENT_EDIT, &details).await;

    Ok(HttpResponse::Ok().json(ApiMessage::new("Perícia atualizada")))
}

pub async fn delete(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    snapshot: web::Data<AppointmentSnapshot>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let (_, email, _) = actor(&session, Capability::Admin)?;
    let id = path.into_inner();
    let before = snapshot.get(id);

    if !appointment::delete(&pool, id).await? {
        return Err(AppError::NotFound);
    }
    snapshot.remove(id);
    snapshot.spawn_refresh(pool.get_ref().clone());

    let details = match before {
        Some(a) => format!("Perícia {id}: {} em {}", a.examinee, a.date),
        None => format!("Perícia {id}"),
    };
    audit::record(&pool, &origin, &req, &email, actions::APPOINTMENT_DELETE, &details).await;

    Ok(HttpResponse::Ok().json(ApiMessage::new("Perícia excluída")))
}
