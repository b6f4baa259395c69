use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;

use crate::db::{self, SqlitePool, SqlitePooledConn};
use crate::error::Result;

mod schema;
use schema::tasks;

#[derive(Debug, Clone, Serialize, Queryable, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub date_added: String,
    pub due_date: String,
    pub plan_id: i64,
    pub completed: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub date_added: String,
    pub due_date: String,
    pub plan_id: i64,
}

pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a task. `plan_id` is not checked against `plans`.
    pub async fn create_task(&self, new: &NewTask) -> Result<()> {
        let mut conn = self.conn().await?;
        diesel::insert_into(tasks::table)
            .values(new)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn list_for_plan(&self, plan_id: i64) -> Result<Vec<Task>> {
        let mut conn = self.conn().await?;
        let rows = tasks::table
            .filter(tasks::plan_id.eq(plan_id))
            .order(tasks::id.asc())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    /// Returns `false` when no task has this id.
    pub async fn mark_done(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(tasks::table.filter(tasks::id.eq(id)))
            .set(tasks::completed.eq(true))
            .execute(&mut conn)
            .await?;
        Ok(updated > 0)
    }

    async fn conn(&self) -> Result<SqlitePooledConn<'_>> {
        db::checkout(&self.pool).await
    }
}

/// Current UTC time in ISO-8601 form, used when a task arrives without `date_added`.
pub fn now_iso() -> String {
    Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
