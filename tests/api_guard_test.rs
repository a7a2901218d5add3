//! Request guards and error bodies of the HTTP layer.

use actix_session::{Session, SessionMiddleware, storage::CookieSessionStore};
use actix_web::{
    App, HttpResponse, ResponseError,
    body::to_bytes,
    cookie::Key,
    http::StatusCode,
    middleware::from_fn,
    test::{self, TestRequest},
    web,
};
use serde_json::Value;

use sigpef::auth::middleware::require_auth;
use sigpef::errors::AppError;
use sigpef::handlers::api::{require_json_content_type, require_pdf_content_type};

async fn ok() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn sign_in(session: Session) -> HttpResponse {
    match session.insert("user_id", 42_i64) {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(_) => HttpResponse::InternalServerError().finish(),
    }
}

async fn body_json(resp: HttpResponse) -> Value {
    let bytes = to_bytes(resp.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[actix_rt::test]
async fn json_guard_rejects_form_posts() {
    let app = test::init_service(
        App::new().service(
            web::scope("/api")
                .wrap(from_fn(require_json_content_type))
                .route("/thing", web::post().to(ok))
                .route("/thing", web::get().to(ok)),
        ),
    )
    .await;

    let req = TestRequest::post()
        .uri("/api/thing")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("a=1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/api/thing")
        .insert_header(("content-type", "application/json; charset=utf-8"))
        .set_payload("{}")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/api/thing").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn pdf_guard_only_accepts_pdf_bodies() {
    let app = test::init_service(
        App::new().service(
            web::resource("/imports")
                .wrap(from_fn(require_pdf_content_type))
                .route(web::post().to(ok))
                .route(web::get().to(ok)),
        ),
    )
    .await;

    let req = TestRequest::post()
        .uri("/imports?file_name=pauta.pdf")
        .insert_header(("content-type", "application/json"))
        .set_payload("{}")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("application/pdf"));

    let req = TestRequest::post()
        .uri("/imports?file_name=pauta.pdf")
        .insert_header(("content-type", "application/pdf"))
        .set_payload(&b"%PDF-1.4"[..])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/imports").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn auth_guard_requires_a_session_user() {
    let app = test::init_service(
        App::new()
            .wrap(SessionMiddleware::new(CookieSessionStore::default(), Key::generate()))
            .route("/login", web::post().to(sign_in))
            .service(
                web::resource("/private")
                    .wrap(from_fn(require_auth))
                    .route(web::get().to(ok)),
            ),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/private").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not logged in");

    let login = test::call_service(&app, TestRequest::post().uri("/login").to_request()).await;
    let cookie = login.response().cookies().next().unwrap().into_owned();

    let req = TestRequest::get().uri("/private").cookie(cookie).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn error_statuses() {
    assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::PendingApproval.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::UndoExpired(60).status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Conflict("dup".into()).status_code(), StatusCode::CONFLICT);
    assert_eq!(AppError::Upstream("down".into()).status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(AppError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[actix_rt::test]
async fn validation_errors_carry_details() {
    let err = AppError::Validation(vec!["Periciado é obrigatório".into(), "Data inválida".into()]);
    let body = body_json(err.error_response()).await;
    assert_eq!(body["details"], "Periciado é obrigatório; Data inválida");
}

#[actix_rt::test]
async fn database_errors_are_not_leaked() {
    let resp = AppError::Db(sqlx::Error::RowNotFound).error_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "Internal Server Error");
    assert!(body["details"].is_null());
}
