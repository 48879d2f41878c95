use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::CommentRow;
use crate::{
    config::Limits,
    error::FieldErrors,
    messages,
    validation::{Checks, Validate},
};

/// Body for creating or editing a comment.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub contents: String,
}

impl Validate for CommentRequest {
    fn validate(&self, _limits: &Limits) -> Result<(), FieldErrors> {
        let mut c = Checks::default();
        c.not_blank("contents", &self.contents, messages::CONTENTS_REQUIRED);
        c.finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub contents: String,
    /// Author's username.
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<CommentRow> for CommentResponse {
    fn from(r: CommentRow) -> Self {
        Self {
            id: r.id,
            contents: r.contents,
            name: r.owner_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
