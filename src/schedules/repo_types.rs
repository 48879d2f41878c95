use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Schedule joined with its author's username.
#[derive(Debug, Clone, FromRow)]
pub struct ScheduleRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub title: String,
    pub contents: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// List projection: the comment list collapses to a count.
#[derive(Debug, Clone, FromRow)]
pub struct ScheduleSummaryRow {
    pub id: Uuid,
    pub owner_name: String,
    pub title: String,
    pub contents: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub comment_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub owner_id: Uuid,
    pub title: String,
    pub contents: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleChanges {
    pub title: Option<String>,
    pub contents: Option<String>,
}
