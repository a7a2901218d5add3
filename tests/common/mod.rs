//! Shared fixtures for the integration tests.
//!
//! Most helpers build plain values for the pure model functions. `setup_test_db`
//! gives database-backed tests a migrated schema of their own when
//! `TEST_DATABASE_URL` points at a Postgres server; without it those tests skip.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use sigpef::audit::LogEntry;
use sigpef::models::appointment::{Appointment, RawAppointment};
use sigpef::models::user::{Role, UserProfile};

pub const ADMIN_EMAIL: &str = "admin@jfpe.jus.br";
pub const EDITOR_EMAIL: &str = "editor@jfpe.jus.br";

/// Canonical appointment with no import batch.
pub fn appt(id: i64, date: &str, expert: &str, specialty: &str, examinee: &str, outcome: &str) -> Appointment {
    Appointment {
        id,
        date: date.to_string(),
        expert: expert.to_string(),
        specialty: specialty.to_string(),
        examinee: examinee.to_string(),
        outcome: outcome.to_string(),
        batch_id: None,
    }
}

pub fn batched(mut a: Appointment, batch_id: &str) -> Appointment {
    a.batch_id = Some(batch_id.to_string());
    a
}

pub fn raw(id: i64, date: &str, examinee: &str, outcome: &str) -> RawAppointment {
    RawAppointment {
        id,
        date: Some(date.to_string()),
        expert: Some("dr. carlos mendes".to_string()),
        specialty: Some("ortopedia".to_string()),
        examinee: Some(examinee.to_string()),
        outcome: Some(outcome.to_string()),
        batch_id: None,
    }
}

/// A small schedule spread over two years, two experts and every outcome.
pub fn schedule() -> Vec<Appointment> {
    vec![
        appt(1, "2025-03-10", "DR. CARLOS MENDES", "ORTOPEDIA", "JOAO DA SILVA", ""),
        appt(2, "2025-03-10", "DRA. ANA MARIA", "CARDIOLOGIA", "MARIA OLIVEIRA", "COMPARECEU"),
        appt(3, "2025-03-11", "DR. CARLOS MENDES", "ORTOPEDIA", "PEDRO SANTOS", "NAO COMPARECEU"),
        appt(4, "2025-04-02", "DRA. ANA MARIA", "CARDIOLOGIA", "JOANA LIMA", "FALECIMENTO"),
        appt(5, "2024-03-15", "DR. CARLOS MENDES", "PSIQUIATRIA", "JOAO PEREIRA", "COMPARECEU"),
        appt(6, "2024-12-31", "DRA. ANA MARIA", "CARDIOLOGIA", "CARLOS ALBERTO", ""),
    ]
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn log_entry(id: i64, email: &str, action: &str, details: &str, ip: &str, created_at: DateTime<Utc>) -> LogEntry {
    LogEntry {
        id,
        user_email: email.to_string(),
        action: action.to_string(),
        details: details.to_string(),
        ip_address: ip.to_string(),
        created_at,
    }
}

pub fn profile(id: i64, email: &str, role: Role, approved: bool) -> UserProfile {
    UserProfile {
        id,
        email: email.to_string(),
        full_name: String::new(),
        role,
        approved,
        last_read_message_id: 0,
        created_at: at(2025, 1, 1, 12, 0),
    }
}

/// A throwaway schema holding a fully migrated copy of the database.
pub struct TestDb {
    pub pool: PgPool,
    admin: PgPool,
    schema: String,
}

impl TestDb {
    pub async fn teardown(self) {
        self.pool.close().await;
        let _ = sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema))
            .execute(&self.admin)
            .await;
    }
}

/// Migrated schema on the server at `TEST_DATABASE_URL`, or `None` when unset.
pub async fn setup_test_db() -> Option<TestDb> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("TEST_DATABASE_URL not set, skipping database test");
            return None;
        }
    };
    let options: PgConnectOptions = url.parse().expect("Invalid TEST_DATABASE_URL");
    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options.clone())
        .await
        .expect("Failed to connect to test database");

    let schema = format!("sigpef_test_{}", uuid::Uuid::new_v4().simple());
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await
        .expect("Failed to create test schema");

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect_with(options.options([("search_path", schema.as_str())]))
        .await
        .expect("Failed to connect with test schema");
    sigpef::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(TestDb { pool, admin, schema })
}

/// Insert a row the way the import pipeline does: raw text, tagged with a batch.
pub async fn insert_raw(pool: &PgPool, date: &str, examinee: &str, batch_id: Option<&str>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO pericias (data_pericia, periciado, perito, especialidade, import_batch_id) \
         VALUES ($1, $2, 'Dr. Carlos Mendes', 'Ortopedia', $3) RETURNING id",
    )
    .bind(date)
    .bind(examinee)
    .bind(batch_id)
    .fetch_one(pool)
    .await
}
