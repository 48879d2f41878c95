use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::PgStore,
    error::StoreError,
    schedules::repo_types::{NewSchedule, ScheduleChanges, ScheduleRow, ScheduleSummaryRow},
};

#[async_trait]
pub trait ScheduleRepo: Send + Sync {
    async fn insert(&self, schedule: NewSchedule) -> Result<ScheduleRow, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<ScheduleRow>, StoreError>;
    /// Every schedule, most recently updated first.
    async fn list(&self) -> Result<Vec<ScheduleSummaryRow>, StoreError>;
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<ScheduleSummaryRow>, StoreError>;
    /// One page ordered like [`ScheduleRepo::list`], plus the total row count.
    async fn page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ScheduleSummaryRow>, i64), StoreError>;
    async fn update(
        &self,
        id: Uuid,
        changes: ScheduleChanges,
    ) -> Result<Option<ScheduleRow>, StoreError>;
    /// Deletes the schedule and its comments in one transaction.
    async fn delete_cascade(&self, id: Uuid) -> Result<bool, StoreError>;
}

const SUMMARY_SELECT: &str = r#"
    SELECT s.id, u.username AS owner_name, s.title, s.contents,
           s.created_at, s.updated_at,
           (SELECT COUNT(*) FROM comments c WHERE c.schedule_id = s.id) AS comment_count
      FROM schedules s
      JOIN users u ON u.id = s.owner_id
"#;

#[async_trait]
impl ScheduleRepo for PgStore {
    async fn insert(&self, schedule: NewSchedule) -> Result<ScheduleRow, StoreError> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            WITH inserted AS (
                INSERT INTO schedules (owner_id, title, contents)
                VALUES ($1, $2, $3)
                RETURNING id, owner_id, title, contents, created_at, updated_at
            )
            SELECT i.id, i.owner_id, u.username AS owner_name, i.title, i.contents,
                   i.created_at, i.updated_at
              FROM inserted i
              JOIN users u ON u.id = i.owner_id
            "#,
        )
        .bind(schedule.owner_id)
        .bind(&schedule.title)
        .bind(&schedule.contents)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<ScheduleRow>, StoreError> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT s.id, s.owner_id, u.username AS owner_name, s.title, s.contents,
                   s.created_at, s.updated_at
              FROM schedules s
              JOIN users u ON u.id = s.owner_id
             WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<ScheduleSummaryRow>, StoreError> {
        let rows = sqlx::query_as::<_, ScheduleSummaryRow>(&format!(
            "{SUMMARY_SELECT} ORDER BY s.updated_at DESC, s.id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<ScheduleSummaryRow>, StoreError> {
        let rows = sqlx::query_as::<_, ScheduleSummaryRow>(&format!(
            "{SUMMARY_SELECT} WHERE s.owner_id = $1 ORDER BY s.updated_at DESC, s.id DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ScheduleSummaryRow>, i64), StoreError> {
        // one snapshot for both statements so the total matches the rows
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query_as::<_, ScheduleSummaryRow>(&format!(
            "{SUMMARY_SELECT} ORDER BY s.updated_at DESC, s.id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schedules")
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok((rows, total))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ScheduleChanges,
    ) -> Result<Option<ScheduleRow>, StoreError> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            WITH updated AS (
                UPDATE schedules
                   SET title = COALESCE($2, title),
                       contents = COALESCE($3, contents),
                       updated_at = now()
                 WHERE id = $1
                RETURNING id, owner_id, title, contents, created_at, updated_at
            )
            SELECT d.id, d.owner_id, u.username AS owner_name, d.title, d.contents,
                   d.created_at, d.updated_at
              FROM updated d
              JOIN users u ON u.id = d.owner_id
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.contents)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE schedule_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }
}
