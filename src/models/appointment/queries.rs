use sqlx::PgPool;

use super::normalize::RawAppointment;
use super::types::NewAppointment;

/// Columns as stored. The date is text because the import pipeline writes whatever
/// the source document used; the `pericias_canonicalize` trigger rewrites valid dates
/// to `YYYY-MM-DD` and uppercases the examinee, so ordering and uniqueness see
/// canonical values. Invalid dates stay as written and end up in quarantine.
#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: i64,
    data_pericia: Option<String>,
    perito: Option<String>,
    especialidade: Option<String>,
    periciado: Option<String>,
    observacao: Option<String>,
    import_batch_id: Option<String>,
}

impl From<AppointmentRow> for RawAppointment {
    fn from(row: AppointmentRow) -> Self {
        RawAppointment {
            id: row.id,
            date: row.data_pericia,
            expert: row.perito,
            specialty: row.especialidade,
            examinee: row.periciado,
            outcome: row.observacao,
            batch_id: row.import_batch_id,
        }
    }
}

const SELECT_APPOINTMENT: &str = "\
    SELECT id, data_pericia, perito, especialidade, periciado, observacao, import_batch_id \
    FROM pericias";

/// Fetch up to `limit` rows ordered by exam date (earliest first).
pub async fn fetch_raw(pool: &PgPool, limit: i64) -> Result<Vec<RawAppointment>, sqlx::Error> {
    let sql = format!("{SELECT_APPOINTMENT} ORDER BY data_pericia ASC, id ASC LIMIT $1");
    let rows: Vec<AppointmentRow> = sqlx::query_as(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(RawAppointment::from).collect())
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<RawAppointment>, sqlx::Error> {
    let sql = format!("{SELECT_APPOINTMENT} WHERE id = $1");
    let row: Option<AppointmentRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(RawAppointment::from))
}

/// Insert a canonicalized appointment with an empty outcome. Returns the new id.
///
/// A second appointment for the same examinee on the same date violates
/// `pericias_periciado_data_key`, whatever format either row was written in.
pub async fn create(pool: &PgPool, new: &NewAppointment) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO pericias (data_pericia, periciado, perito, especialidade, observacao) \
         VALUES ($1, $2, $3, $4, '') RETURNING id",
    )
    .bind(&new.date)
    .bind(&new.examinee)
    .bind(&new.expert)
    .bind(&new.specialty)
    .fetch_one(pool)
    .await
}

/// Update outcome and/or examinee name. Returns false when the row does not exist.
pub async fn update(
    pool: &PgPool,
    id: i64,
    outcome: Option<&str>,
    examinee: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE pericias SET \
            observacao = COALESCE($2, observacao), \
            periciado = COALESCE($3, periciado) \
         WHERE id = $1",
    )
    .bind(id)
    .bind(outcome)
    .bind(examinee)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pericias WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every row tagged with an import batch. Returns the number of rows removed.
pub async fn delete_batch(pool: &PgPool, batch_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pericias WHERE import_batch_id = $1")
        .bind(batch_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Rows currently tagged with an import batch.
pub async fn count_batch(pool: &PgPool, batch_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM pericias WHERE import_batch_id = $1")
        .bind(batch_id)
        .fetch_one(pool)
        .await
}
