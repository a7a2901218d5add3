use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::{self, OriginIp, actions};
use crate::auth::capabilities::Capability;
use crate::auth::session::actor;
use crate::errors::AppError;
use crate::integrations::PipelineClient;
use crate::models::appointment;
use crate::models::import_batch::{self, HISTORY_LIMIT};
use crate::snapshot::AppointmentSnapshot;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub batch_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UndoResponse {
    pub deleted: u64,
    pub message: String,
}

/// Undo result message. Zero deleted rows is reported as a warning, not an error.
pub fn undo_message(deleted: u64) -> String {
    if deleted == 0 {
        "Nenhum registro encontrado para este lote. Ele pode já ter sido removido.".to_string()
    } else {
        format!("{deleted} registro(s) removido(s).")
    }
}

/// Point the uploader at the undo for rows a failed import left behind.
pub fn partial_import_error(err: AppError, batch_id: &str, written: i64) -> AppError {
    if written <= 0 {
        return err;
    }
    let note = format!(
        "{written} registro(s) já gravado(s) no lote {batch_id}; use Desfazer para removê-los."
    );
    match err {
        AppError::Conflict(msg) => AppError::Conflict(format!("{msg} {note}")),
        AppError::Upstream(msg) => AppError::Upstream(format!("{msg} {note}")),
        other => other,
    }
}

/// POST /api/v1/imports?file_name=... - forward a PDF schedule to the import pipeline.
pub async fn upload(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    pipeline: web::Data<PipelineClient>,
    snapshot: web::Data<AppointmentSnapshot>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let (user_id, email, _) = actor(&session, Capability::Edit)?;

    let file_name = query.file_name.trim().to_string();
    if file_name.is_empty() {
        return Err(AppError::validation("Nome do arquivo é obrigatório"));
    }
    if body.is_empty() {
        return Err(AppError::validation("Arquivo vazio"));
    }

    let recent = import_batch::find_recent_for_user(&pool, user_id, HISTORY_LIMIT).await?;
    if import_batch::is_recent_duplicate(&recent, &file_name) {
        return Err(AppError::Conflict(format!(
            "O arquivo \"{file_name}\" já foi enviado recentemente."
        )));
    }

    // Recorded up front: a pipeline that stops partway has already written tagged rows.
    let batch_id = import_batch::generate_batch_id();
    import_batch::record(&pool, &batch_id, &file_name, user_id).await?;

    let message = match pipeline.upload(&file_name, body.to_vec(), &batch_id).await {
        Ok(message) => message,
        Err(e) => {
            let written = appointment::count_batch(&pool, &batch_id).await?;
            if written == 0 {
                import_batch::remove(&pool, &batch_id).await?;
            } else {
                log::warn!("Import of {file_name} failed after {written} rows (batch {batch_id})");
                snapshot.spawn_refresh(pool.get_ref().clone());
                let details = format!(
                    "Falha parcial no arquivo: {file_name} (Lote: {batch_id}, {written} registros). Erro: {e}"
                );
                audit::record(&pool, &origin, &req, &email, actions::IMPORT_UPLOAD, &details).await;
            }
            return Err(partial_import_error(e, &batch_id, written));
        }
    };
    snapshot.spawn_refresh(pool.get_ref().clone());

    let details = format!("Enviou arquivo: {file_name} (Lote: {batch_id}). Msg: {message}");
    audit::record(&pool, &origin, &req, &email, actions::IMPORT_UPLOAD, &details).await;

    Ok(HttpResponse::Ok().json(UploadResponse { batch_id, message }))
}

/// GET /api/v1/imports - the caller's most recent uploads.
pub async fn history(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let (user_id, _, _) = actor(&session, Capability::Edit)?;
    let batches = import_batch::find_recent_for_user(&pool, user_id, HISTORY_LIMIT).await?;
    Ok(HttpResponse::Ok().json(batches))
}

/// DELETE /api/v1/imports/{batch_id} - remove every appointment the batch created.
pub async fn undo(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    origin: web::Data<OriginIp>,
    snapshot: web::Data<AppointmentSnapshot>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let (user_id, email, caps) = actor(&session, Capability::Edit)?;
    let batch_id = path.into_inner();

    let window = caps
        .undo_window()
        .ok_or_else(|| AppError::PermissionDenied("undo".to_string()))?;
    let batch = import_batch::find(&pool, &batch_id).await?.ok_or(AppError::NotFound)?;
    if batch.uploaded_by != user_id && !caps.admin {
        return Err(AppError::PermissionDenied("undo".to_string()));
    }
    if !batch.undo_allowed(Utc::now(), window) {
        return Err(AppError::UndoExpired(window.num_minutes()));
    }

    let deleted = appointment::delete_batch(&pool, &batch_id).await?;
    import_batch::remove(&pool, &batch_id).await?;
    snapshot.remove_batch(&batch_id);
    snapshot.spawn_refresh(pool.get_ref().clone());

    let details = format!(
        "Apagou lote {batch_id} do arquivo {} ({deleted} registros)",
        batch.file_name
    );
    audit::record(&pool, &origin, &req, &email, actions::IMPORT_UNDO, &details).await;

    Ok(HttpResponse::Ok().json(UndoResponse {
        deleted,
        message: undo_message(deleted),
    }))
}
