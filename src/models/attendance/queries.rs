use sqlx::PgPool;

use super::types::{AttendanceInput, AttendanceRecord, PunchField};

const SELECT_ATTENDANCE: &str = "\
    SELECT id, data_pericia, perito, \
           COALESCE(vara, '') AS vara, COALESCE(sala, '') AS sala, \
           hora_chegada, hora_saida \
    FROM controle_presenca";

/// All records, newest exam date first.
pub async fn find_all(pool: &PgPool) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let sql = format!("{SELECT_ATTENDANCE} ORDER BY data_pericia DESC, id DESC");
    sqlx::query_as(&sql).fetch_all(pool).await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    let sql = format!("{SELECT_ATTENDANCE} WHERE id = $1");
    sqlx::query_as(&sql).bind(id).fetch_optional(pool).await
}

pub async fn create(pool: &PgPool, input: &AttendanceInput) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO controle_presenca (data_pericia, perito, vara, sala, hora_chegada, hora_saida) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(&input.data_pericia)
    .bind(&input.perito)
    .bind(&input.vara)
    .bind(&input.sala)
    .bind(&input.hora_chegada)
    .bind(&input.hora_saida)
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, id: i64, input: &AttendanceInput) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE controle_presenca SET data_pericia = $2, perito = $3, vara = $4, sala = $5, \
                hora_chegada = $6, hora_saida = $7 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(&input.data_pericia)
    .bind(&input.perito)
    .bind(&input.vara)
    .bind(&input.sala)
    .bind(&input.hora_chegada)
    .bind(&input.hora_saida)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Set one clock field. The column name comes from [`PunchField::column`], never from input.
pub async fn set_time(
    pool: &PgPool,
    id: i64,
    field: PunchField,
    value: &str,
) -> Result<bool, sqlx::Error> {
    let sql = format!("UPDATE controle_presenca SET {} = $2 WHERE id = $1", field.column());
    let result = sqlx::query(&sql).bind(id).bind(value).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM controle_presenca WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
