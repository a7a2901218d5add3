use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::auth::capabilities::Capability;
use crate::auth::session::require;
use crate::errors::AppError;
use crate::integrations::LegacySheetClient;
use crate::integrations::legacy_sheet::LegacyUpdate;
use crate::models::appointment::{Appointment, Rejected};
use crate::responses::ApiMessage;

#[derive(Debug, Serialize)]
pub struct LegacyRowsResponse {
    pub items: Vec<Appointment>,
    pub rejected: Vec<Rejected>,
}

fn client(sheet: Option<web::Data<LegacySheetClient>>) -> Result<web::Data<LegacySheetClient>, AppError> {
    sheet.ok_or_else(|| AppError::Upstream("Planilha legada não configurada".to_string()))
}

/// GET /api/v1/legacy/rows
pub async fn rows(
    session: Session,
    sheet: Option<web::Data<LegacySheetClient>>,
) -> Result<HttpResponse, AppError> {
    require(&session, Capability::Admin)?;
    let (items, rejected) = client(sheet)?.fetch_rows().await?;
    Ok(HttpResponse::Ok().json(LegacyRowsResponse { items, rejected }))
}

/// PUT /api/v1/legacy/rows - write the outcome of one sheet row.
pub async fn update(
    session: Session,
    sheet: Option<web::Data<LegacySheetClient>>,
    body: web::Json<LegacyUpdate>,
) -> Result<HttpResponse, AppError> {
    require(&session, Capability::Admin)?;
    client(sheet)?
        .update_observation(body.row_id, &body.observacao)
        .await?;
    Ok(HttpResponse::Ok().json(ApiMessage::new("Linha atualizada")))
}
