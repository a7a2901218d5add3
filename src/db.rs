use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::password;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::user::{self, NewUser, Role};

const MAX_CONNECTIONS: u32 = 8;

pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Create the first administrator from `ADMIN_EMAIL`/`ADMIN_PASSWORD` when none exists.
pub async fn seed_admin(pool: &PgPool, config: &Config) -> Result<(), AppError> {
    if user::count_admins(pool).await? > 0 {
        return Ok(());
    }
    let (Some(email), Some(pass)) = (&config.admin_email, &config.admin_password) else {
        log::warn!("No administrator exists and ADMIN_EMAIL/ADMIN_PASSWORD are not set");
        return Ok(());
    };

    let new_user = NewUser {
        email: email.trim().to_lowercase(),
        full_name: "Administrador".to_string(),
        password: password::hash_password(pass)?,
        role: Role::Admin,
        approved: true,
    };
    match user::create(pool, &new_user).await {
        Ok(id) => log::info!("Seeded administrator {} (id {id})", new_user.email),
        Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
            // Account exists but is not an approved admin; promote it.
            if let Some(row) = user::find_by_email(pool, &new_user.email).await? {
                user::update_access(pool, row.id, Some(Role::Admin), Some(true)).await?;
                log::info!("Promoted existing account {} to administrator", new_user.email);
            }
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
