use sqlx::{PgConnection, PgPool};

use crate::DbError;

use super::pg_err;

/// Fixed key for the Postgres advisory lock that serialises migration runs.
pub const MIGRATION_LOCK_KEY: i64 = 0x7061_6c61_7665_7221; // "palaver!"

/// Advisory locks belong to a session, so lock, migrate and unlock all run
/// on one checked-out connection.
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    let mut conn = pool.acquire().await.map_err(pg_err)?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .map_err(pg_err)?;

    let result = run_inner(&mut conn).await;

    let released: Result<bool, sqlx::Error> = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .fetch_one(&mut *conn)
        .await;
    match released {
        Ok(true) => {}
        Ok(false) => tracing::warn!("migration lock was not held at unlock"),
        Err(e) => {
            tracing::warn!("migration unlock failed, closing connection: {e}");
            drop(conn.detach());
        }
    }

    result
}

async fn run_inner(conn: &mut PgConnection) -> Result<(), DbError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(&mut *conn)
    .await
    .map_err(pg_err)?;

    let current: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
        .fetch_one(&mut *conn)
        .await
        .map_err(pg_err)?;

    if current < 1 {
        sqlx::raw_sql(include_str!("sql/V1__initial.sql"))
            .execute(&mut *conn)
            .await
            .map_err(pg_err)?;
        tracing::debug!("applied postgres migration v1");
    }

    Ok(())
}
