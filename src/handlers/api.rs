use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
    middleware::{Next, from_fn},
    web,
};

use super::{
    admin_handlers, appointment_handlers, attendance_handlers, auth_handlers, import_handlers,
    legacy_handlers, message_handlers, report_handlers,
};
use crate::auth::middleware::require_auth;
use crate::responses::ApiErrorResponse;

fn is_mutation(method: &Method) -> bool {
    method == Method::POST || method == Method::PUT || method == Method::DELETE
}

/// `Some(response)` when a mutation arrives without the expected content type.
fn content_type_rejection(req: &ServiceRequest, expected: &str) -> Option<HttpResponse> {
    if !is_mutation(req.method()) {
        return None;
    }
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with(expected) {
        None
    } else {
        Some(HttpResponse::BadRequest().json(ApiErrorResponse {
            error: format!("Content-Type must be {expected} for mutation requests"),
            details: None,
        }))
    }
}

/// CSRF protection for JSON mutation endpoints.
///
/// Browsers cannot send cross-origin JSON with cookies via a simple form POST,
/// so requiring `application/json` on POST/PUT/DELETE guards against CSRF
/// without tokens. GET requests are exempt.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if let Some(response) = content_type_rejection(&req, "application/json") {
        return Ok(req.into_response(response).map_into_right_body());
    }
    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Same guard for the upload endpoint, which takes a raw PDF body.
pub async fn require_pdf_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if let Some(response) = content_type_rejection(&req, "application/pdf") {
        return Ok(req.into_response(response).map_into_right_body());
    }
    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Configure `/api/v1` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .wrap(from_fn(require_json_content_type))
            .route("/signup", web::post().to(auth_handlers::signup))
            .route("/login", web::post().to(auth_handlers::login))
            .route("/logout", web::post().to(auth_handlers::logout))
            .route("/refresh", web::post().to(auth_handlers::refresh)),
    );
    cfg.service(
        web::resource("/me")
            .wrap(from_fn(require_auth))
            .route(web::get().to(auth_handlers::me)),
    );
    cfg.service(
        web::scope("/appointments")
            .wrap(from_fn(require_json_content_type))
            .wrap(from_fn(require_auth))
            .route("", web::get().to(appointment_handlers::list))
            .route("", web::post().to(appointment_handlers::create))
            .route("/quarantine", web::get().to(appointment_handlers::quarantine))
            .route("/{id}", web::put().to(appointment_handlers::update))
            .route("/{id}", web::delete().to(appointment_handlers::delete)),
    );
    cfg.service(
        web::scope("/attendance")
            .wrap(from_fn(require_json_content_type))
            .wrap(from_fn(require_auth))
            .route("", web::get().to(attendance_handlers::list))
            .route("", web::post().to(attendance_handlers::create))
            .route("/{id}", web::put().to(attendance_handlers::update))
            .route("/{id}", web::delete().to(attendance_handlers::delete))
            .route("/{id}/punch", web::post().to(attendance_handlers::punch)),
    );
    cfg.service(
        web::scope("/reports")
            .wrap(from_fn(require_auth))
            .route("", web::get().to(report_handlers::report))
            .route("/export.csv", web::get().to(report_handlers::export_csv)),
    );
    cfg.service(
        web::scope("/imports")
            .wrap(from_fn(require_auth))
            .service(
                web::resource("")
                    .wrap(from_fn(require_pdf_content_type))
                    .route(web::get().to(import_handlers::history))
                    .route(web::post().to(import_handlers::upload)),
            )
            .service(
                web::resource("/{batch_id}")
                    .wrap(from_fn(require_json_content_type))
                    .route(web::delete().to(import_handlers::undo)),
            ),
    );
    cfg.service(
        web::scope("/messages")
            .wrap(from_fn(require_json_content_type))
            .wrap(from_fn(require_auth))
            .route("", web::get().to(message_handlers::list))
            .route("", web::post().to(message_handlers::send))
            .route("/read", web::post().to(message_handlers::mark_read)),
    );
    cfg.service(
        web::scope("/admin")
            .wrap(from_fn(require_json_content_type))
            .wrap(from_fn(require_auth))
            .route("/users", web::get().to(admin_handlers::list_users))
            .route("/users/{id}", web::put().to(admin_handlers::update_access))
            .route("/users/{id}/password", web::put().to(admin_handlers::reset_password))
            .route("/logs", web::get().to(admin_handlers::logs)),
    );
    cfg.service(
        web::scope("/legacy")
            .wrap(from_fn(require_json_content_type))
            .wrap(from_fn(require_auth))
            .route("/rows", web::get().to(legacy_handlers::rows))
            .route("/rows", web::put().to(legacy_handlers::update)),
    );
}
