use sqlx::PgPool;

use super::types::{NewUser, Role, UserProfile, UserRow};

const SELECT_USER: &str = "\
    SELECT id, email, COALESCE(full_name, '') AS full_name, role, approved, password, \
           last_read_message_id, created_at \
    FROM profiles";

/// Find a user by email for authentication. Returns the row with its password hash.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, sqlx::Error> {
    let sql = format!("{SELECT_USER} WHERE lower(email) = lower($1)");
    sqlx::query_as(&sql)
        .bind(email.trim())
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<UserProfile>, sqlx::Error> {
    let sql = format!("{SELECT_USER} WHERE id = $1");
    let row: Option<UserRow> = sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.map(UserProfile::from))
}

/// All profiles, newest first, optionally narrowed by an email/name substring.
pub async fn find_all(pool: &PgPool, search: Option<&str>) -> Result<Vec<UserProfile>, sqlx::Error> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()));

    let sql = format!(
        "{SELECT_USER} \
         WHERE ($1::text IS NULL OR lower(email) LIKE $1 OR lower(COALESCE(full_name, '')) LIKE $1) \
         ORDER BY created_at DESC"
    );
    let rows: Vec<UserRow> = sqlx::query_as(&sql).bind(pattern).fetch_all(pool).await?;
    Ok(rows.into_iter().map(UserProfile::from).collect())
}

pub async fn create(pool: &PgPool, new: &NewUser) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO profiles (email, full_name, password, role, approved) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(new.email.trim())
    .bind(new.full_name.trim())
    .bind(&new.password)
    .bind(new.role.as_str())
    .bind(new.approved)
    .fetch_one(pool)
    .await
}

/// Change role and/or approval. `None` leaves the field unchanged.
pub async fn update_access(
    pool: &PgPool,
    id: i64,
    role: Option<Role>,
    approved: Option<bool>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE profiles SET role = COALESCE($2, role), approved = COALESCE($3, approved) \
         WHERE id = $1",
    )
    .bind(id)
    .bind(role.map(|r| r.as_str()))
    .bind(approved)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_password(pool: &PgPool, id: i64, hash: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE profiles SET password = $2 WHERE id = $1")
        .bind(id)
        .bind(hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Approved administrators; used for last-admin protection and first-run seeding.
pub async fn count_admins(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE role = 'admin' AND approved")
        .fetch_one(pool)
        .await
}

/// Advance the user's read marker for broadcast messages. Never moves it backwards.
pub async fn mark_messages_read(pool: &PgPool, id: i64, message_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE profiles SET last_read_message_id = GREATEST(last_read_message_id, $2) WHERE id = $1",
    )
    .bind(id)
    .bind(message_id)
    .execute(pool)
    .await?;
    Ok(())
}
