use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::capabilities::Capability;
use crate::auth::session::require;
use crate::errors::AppError;
use crate::models::report::{self, Report, ReportQuery};
use crate::snapshot::AppointmentSnapshot;

fn build(snapshot: &AppointmentSnapshot, query: &ReportQuery) -> Result<Report, AppError> {
    query.run(&snapshot.all()).map_err(AppError::Validation)
}

/// GET /api/v1/reports - rows sorted by date plus the status summary.
pub async fn report(
    session: Session,
    snapshot: web::Data<AppointmentSnapshot>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    require(&session, Capability::View)?;
    Ok(HttpResponse::Ok().json(build(&snapshot, &query)?))
}

/// GET /api/v1/reports/export.csv
pub async fn export_csv(
    session: Session,
    snapshot: web::Data<AppointmentSnapshot>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    require(&session, Capability::View)?;
    let report = build(&snapshot, &query)?;
    let file_name = report::file_name(&report);

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(report::to_csv(&report)))
}
