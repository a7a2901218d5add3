use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use sigpef::audit::{self, OriginIp};
use sigpef::auth::rate_limit::RateLimiter;
use sigpef::config::Config;
use sigpef::integrations::{LegacySheetClient, PipelineClient};
use sigpef::snapshot::AppointmentSnapshot;
use sigpef::{db, handlers, realtime};

fn session_key(config: &Config) -> Key {
    // Session encryption key; set SESSION_KEY for sessions that survive restarts
    match &config.session_key {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+) - generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set - generating random key (sessions lost on restart)");
            Key::generate()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(std::io::Error::other)?;

    let pool = db::init_pool(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;
    db::run_migrations(&pool).await.map_err(std::io::Error::other)?;
    if let Err(e) = db::seed_admin(&pool, &config).await {
        log::error!("Administrator seeding failed: {e}");
    }

    match audit::cleanup_old_entries(&pool, config.audit_retention_days).await {
        Ok(0) => {}
        Ok(n) => log::info!("Removed {n} audit entries older than {} days", config.audit_retention_days),
        Err(e) => log::error!("Audit cleanup failed: {e}"),
    }

    let http = config.http_client();
    let snapshot = AppointmentSnapshot::new(config.appointment_fetch_limit);
    if let Err(e) = snapshot.refresh(&pool).await {
        log::error!("Initial appointment load failed, starting empty: {e}");
    }

    let conn_map = realtime::new_connection_map();
    realtime::spawn_listener(pool.clone(), snapshot.clone(), conn_map.clone());

    let limiter = RateLimiter::new();
    let pipeline = PipelineClient::new(http.clone(), config.import_webhook_url.clone());
    if !pipeline.is_configured() {
        log::warn!("IMPORT_WEBHOOK_URL not set - PDF import disabled");
    }
    let legacy = config
        .legacy_sheet_url
        .clone()
        .map(|url| web::Data::new(LegacySheetClient::new(http.clone(), url)));
    let origin = web::Data::new(OriginIp::new(http.clone(), config.ip_lookup_url.clone()));

    let secret_key = session_key(&config);
    let bind_addr = config.bind_addr.clone();
    let max_upload = config.max_upload_bytes;

    log::info!("Starting server at http://{bind_addr}");

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(false)
        .cookie_http_only(true)
        .build();

        let mut app = App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::PayloadConfig::new(max_upload))
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(snapshot.clone()))
            .app_data(web::Data::new(conn_map.clone()))
            .app_data(web::Data::new(limiter.clone()))
            .app_data(web::Data::new(pipeline.clone()))
            .app_data(origin.clone());
        if let Some(legacy) = &legacy {
            app = app.app_data(legacy.clone());
        }

        app.route("/ws", web::get().to(handlers::ws::ws_connect))
            .service(web::scope("/api/v1").configure(handlers::api::configure))
    })
    .bind(bind_addr)?
    .run()
    .await
}
