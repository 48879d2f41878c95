use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Comment joined with its author's username.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub contents: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub schedule_id: Uuid,
    pub owner_id: Uuid,
    pub contents: String,
}
