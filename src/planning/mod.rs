use chrono::{NaiveDateTime, TimeDelta};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;

use crate::db::{self, SqlitePool, SqlitePooledConn};
use crate::error::Result;

mod schema;
use schema::plans;

pub const STATUS_COMPLETED: &str = "Completed";

/// How far back "recent" reaches for completed plans.
pub const RETENTION_DAYS: i64 = 365;

/// Row shape returned by `GET /api/plans`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanSummary {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Row shape returned by `GET /api/done-plans`; status is implied.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompletedPlan {
    pub id: i64,
    pub title: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Queryable)]
struct PlanRow {
    id: i64,
    title: String,
    create_date: Option<String>,
    end_date: Option<String>,
    status: String,
    // Only the cleanup sweep reads it, and it does so in SQL.
    #[allow(dead_code)]
    completed_date: Option<String>,
}

/// Fields accepted on plan creation. Nothing is validated here; a missing
/// title is rejected by the `NOT NULL` constraint instead.
#[derive(Debug, Clone, Default, Insertable)]
#[diesel(table_name = plans)]
pub struct NewPlan {
    pub title: Option<String>,
    #[diesel(column_name = create_date)]
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub struct PlanStore {
    pool: SqlitePool,
}

impl PlanStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_plan(&self, new: &NewPlan) -> Result<()> {
        let mut conn = self.conn().await?;
        diesel::insert_into(plans::table)
            .values(new)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn list_plans(&self) -> Result<Vec<PlanSummary>> {
        let mut conn = self.conn().await?;
        let rows: Vec<PlanRow> = plans::table
            .order(plans::id.asc())
            .load(&mut conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| PlanSummary {
                id: row.id,
                title: row.title,
                status: row.status,
                start_date: row.create_date,
                end_date: row.end_date,
            })
            .collect())
    }

    /// Completed plans whose `end_date` falls within the retention window.
    pub async fn list_recent_completed(&self, now: NaiveDateTime) -> Result<Vec<CompletedPlan>> {
        let cutoff = retention_cutoff(now);
        let mut conn = self.conn().await?;
        let rows: Vec<PlanRow> = plans::table
            .filter(plans::status.eq(STATUS_COMPLETED))
            .filter(plans::end_date.ge(cutoff))
            .order(plans::id.asc())
            .load(&mut conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| CompletedPlan {
                id: row.id,
                title: row.title,
                start_date: row.create_date,
                end_date: row.end_date,
            })
            .collect())
    }

    /// Deletes completed plans whose `completed_date` predates the retention
    /// window. Rows without a `completed_date` never match. Tasks are kept.
    pub async fn cleanup_completed(&self, now: NaiveDateTime) -> Result<usize> {
        let cutoff = retention_cutoff(now);
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(
            plans::table
                .filter(plans::status.eq(STATUS_COMPLETED))
                .filter(plans::completed_date.lt(cutoff)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted)
    }

    /// Flips `status` to Completed. Returns `false` when the plan does not exist.
    /// `completed_date` is left untouched.
    pub async fn mark_done(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn().await?;
        let existing: Option<i64> = plans::table
            .filter(plans::id.eq(id))
            .select(plans::id)
            .first(&mut conn)
            .await
            .optional()?;
        if existing.is_none() {
            return Ok(false);
        }

        diesel::update(plans::table.filter(plans::id.eq(id)))
            .set(plans::status.eq(STATUS_COMPLETED))
            .execute(&mut conn)
            .await?;
        Ok(true)
    }

    async fn conn(&self) -> Result<SqlitePooledConn<'_>> {
        db::checkout(&self.pool).await
    }
}

/// `now - 365 days` as text, in the same layout the stored date strings are
/// compared against.
pub fn retention_cutoff(now: NaiveDateTime) -> String {
    (now - TimeDelta::days(RETENTION_DAYS))
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::{tempdir, TempDir};

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    async fn store() -> (TempDir, PlanStore) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plans.db");
        let pool = db::open_pool(path.to_string_lossy()).await.unwrap();
        (dir, PlanStore::new(pool))
    }

    fn plan(title: &str, start: &str, end: &str) -> NewPlan {
        NewPlan {
            title: Some(title.to_string()),
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
        }
    }

    async fn set_completed_date(store: &PlanStore, id: i64, date: &str) {
        let mut conn = store.conn().await.unwrap();
        diesel::update(plans::table.filter(plans::id.eq(id)))
            .set(plans::completed_date.eq(date))
            .execute(&mut conn)
            .await
            .unwrap();
    }

    #[test]
    fn cutoff_is_one_year_back_with_microseconds() {
        assert_eq!(
            retention_cutoff(at("2025-06-15")),
            "2024-06-15 12:00:00.000000"
        );
    }

    #[tokio::test]
    async fn new_plans_default_to_pending_and_expose_start_date() {
        let (_dir, store) = store().await;
        store
            .create_plan(&plan("Trip", "2025-01-01", "2025-01-10"))
            .await
            .unwrap();

        let plans = store.list_plans().await.unwrap();
        assert_eq!(
            plans,
            vec![PlanSummary {
                id: 1,
                title: "Trip".to_string(),
                status: "Pending".to_string(),
                start_date: Some("2025-01-01".to_string()),
                end_date: Some("2025-01-10".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn missing_title_is_a_storage_error() {
        let (_dir, store) = store().await;
        let untitled = NewPlan {
            start_date: Some("2025-01-01".to_string()),
            ..NewPlan::default()
        };
        let err = store.create_plan(&untitled).await.unwrap_err();
        assert!(err.to_string().contains("NOT NULL"));
        assert!(store.list_plans().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_done_reports_missing_plans_and_is_repeatable() {
        let (_dir, store) = store().await;
        assert!(!store.mark_done(42).await.unwrap());
        assert!(store.list_plans().await.unwrap().is_empty());

        store
            .create_plan(&plan("Move", "2025-02-01", "2025-02-02"))
            .await
            .unwrap();
        assert!(store.mark_done(1).await.unwrap());
        assert!(store.mark_done(1).await.unwrap());
        assert_eq!(store.list_plans().await.unwrap()[0].status, STATUS_COMPLETED);
    }

    #[tokio::test]
    async fn recent_completed_filters_on_status_and_end_date() {
        let (_dir, store) = store().await;
        let now = at("2025-06-15");
        store
            .create_plan(&plan("recent", "2025-01-01", "2025-03-01"))
            .await
            .unwrap();
        store
            .create_plan(&plan("stale", "2023-01-01", "2023-03-01"))
            .await
            .unwrap();
        store
            .create_plan(&plan("open", "2025-01-01", "2025-03-01"))
            .await
            .unwrap();
        store.mark_done(1).await.unwrap();
        store.mark_done(2).await.unwrap();

        let done = store.list_recent_completed(now).await.unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].title, "recent");
        assert_eq!(done[0].start_date.as_deref(), Some("2025-01-01"));
    }

    #[tokio::test]
    async fn cleanup_only_removes_old_completed_plans_with_completed_date() {
        let (_dir, store) = store().await;
        let now = at("2025-06-15");
        for title in ["old-done", "recent-done", "no-date-done", "old-pending"] {
            store
                .create_plan(&plan(title, "2023-01-01", "2023-02-01"))
                .await
                .unwrap();
        }
        for id in 1..=3 {
            store.mark_done(id).await.unwrap();
        }
        set_completed_date(&store, 1, "2023-02-01").await;
        set_completed_date(&store, 2, "2025-05-01").await;
        set_completed_date(&store, 4, "2023-02-01").await;

        assert_eq!(store.cleanup_completed(now).await.unwrap(), 1);
        let titles: Vec<String> = store
            .list_plans()
            .await
            .unwrap()
            .into_iter()
            .map(|plan| plan.title)
            .collect();
        assert_eq!(titles, vec!["recent-done", "no-date-done", "old-pending"]);

        assert_eq!(store.cleanup_completed(now).await.unwrap(), 0);
    }
}
