use std::path::Path;

use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{PlannerError, Result};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// SQLite serializes writers per file, so the pool hands out a single connection.
const POOL_SIZE: u32 = 1;

pub type SqliteAsyncConn = SyncConnectionWrapper<SqliteConnection>;
pub type SqlitePool = Pool<SqliteAsyncConn>;
pub type SqlitePooledConn<'a> = PooledConnection<'a, SqliteAsyncConn>;

/// Opens the shared pool for `sqlite_path`, applying pending migrations first.
pub async fn open_pool(sqlite_path: impl AsRef<str>) -> Result<SqlitePool> {
    let sqlite_path = sqlite_path.as_ref();
    ensure_parent_dir(sqlite_path)?;
    run_migrations(sqlite_path).await?;

    let manager = AsyncDieselConnectionManager::<SqliteAsyncConn>::new(sqlite_path);
    let pool: SqlitePool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .await
        .map_err(|e| PlannerError::Storage(e.to_string()))?;
    tracing::debug!(path = sqlite_path, "opened sqlite pool");
    Ok(pool)
}

pub async fn checkout(pool: &SqlitePool) -> Result<SqlitePooledConn<'_>> {
    pool.get()
        .await
        .map_err(|e| PlannerError::Storage(e.to_string()))
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PlannerError::Config(format!(
                "failed to create {}: {e}",
                parent.to_string_lossy()
            ))
        })?;
    }
    Ok(())
}

async fn run_migrations(database_url: &str) -> Result<()> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = SqliteConnection::establish(&database_url)
            .map_err(|e| PlannerError::Storage(e.to_string()))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| PlannerError::Storage(e.to_string()))?;
        if !applied.is_empty() {
            tracing::info!(count = applied.len(), "applied database migrations");
        }
        Ok::<_, PlannerError>(())
    })
    .await
    .map_err(|e| PlannerError::Runtime(e.to_string()))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel_async::RunQueryDsl;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_pool_creates_parent_dirs_and_tables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("planner.db");
        let pool = open_pool(path.to_string_lossy()).await.unwrap();

        let mut conn = checkout(&pool).await.unwrap();
        diesel::sql_query(
            "SELECT id, title, create_date, end_date, status, completed_date FROM plans",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        diesel::sql_query(
            "SELECT id, name, description, date_added, due_date, plan_id, completed FROM tasks",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn reopening_an_existing_database_is_a_no_op() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.db");
        let path = path.to_string_lossy().to_string();
        drop(open_pool(&path).await.unwrap());
        open_pool(&path).await.unwrap();
    }
}
