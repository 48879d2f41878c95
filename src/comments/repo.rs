use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    comments::repo_types::{CommentRow, NewComment},
    db::PgStore,
    error::StoreError,
};

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn insert(&self, comment: NewComment) -> Result<CommentRow, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<CommentRow>, StoreError>;
    /// Comments of one schedule in creation order.
    async fn list_by_schedule(&self, schedule_id: Uuid) -> Result<Vec<CommentRow>, StoreError>;
    async fn update(&self, id: Uuid, contents: String) -> Result<Option<CommentRow>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
impl CommentRepo for PgStore {
    async fn insert(&self, comment: NewComment) -> Result<CommentRow, StoreError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (schedule_id, owner_id, contents)
                VALUES ($1, $2, $3)
                RETURNING id, schedule_id, owner_id, contents, created_at, updated_at
            )
            SELECT i.id, i.schedule_id, i.owner_id, u.username AS owner_name, i.contents,
                   i.created_at, i.updated_at
              FROM inserted i
              JOIN users u ON u.id = i.owner_id
            "#,
        )
        .bind(comment.schedule_id)
        .bind(comment.owner_id)
        .bind(&comment.contents)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<CommentRow>, StoreError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.schedule_id, c.owner_id, u.username AS owner_name, c.contents,
                   c.created_at, c.updated_at
              FROM comments c
              JOIN users u ON u.id = c.owner_id
             WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_by_schedule(&self, schedule_id: Uuid) -> Result<Vec<CommentRow>, StoreError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.schedule_id, c.owner_id, u.username AS owner_name, c.contents,
                   c.created_at, c.updated_at
              FROM comments c
              JOIN users u ON u.id = c.owner_id
             WHERE c.schedule_id = $1
             ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update(&self, id: Uuid, contents: String) -> Result<Option<CommentRow>, StoreError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH updated AS (
                UPDATE comments
                   SET contents = $2, updated_at = now()
                 WHERE id = $1
                RETURNING id, schedule_id, owner_id, contents, created_at, updated_at
            )
            SELECT d.id, d.schedule_id, d.owner_id, u.username AS owner_name, d.contents,
                   d.created_at, d.updated_at
              FROM updated d
              JOIN users u ON u.id = d.owner_id
            "#,
        )
        .bind(id)
        .bind(contents)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}
