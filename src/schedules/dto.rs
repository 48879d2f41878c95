use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ScheduleRow, ScheduleSummaryRow};
use crate::{
    comments::dto::CommentResponse,
    config::Limits,
    error::{AppError, FieldErrors},
    messages,
    validation::{Checks, Validate},
};

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub contents: String,
}

impl Validate for CreateScheduleRequest {
    fn validate(&self, limits: &Limits) -> Result<(), FieldErrors> {
        let mut c = Checks::default();
        c.not_blank("title", &self.title, messages::TITLE_REQUIRED);
        let max = limits.title_max_len;
        c.max_len("title", self.title.trim(), max, messages::title_too_long(max));
        c.not_blank("contents", &self.contents, messages::CONTENTS_REQUIRED);
        c.finish()
    }
}

/// Only provided fields change.
#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub title: Option<String>,
    pub contents: Option<String>,
}

impl Validate for UpdateScheduleRequest {
    fn validate(&self, limits: &Limits) -> Result<(), FieldErrors> {
        let mut c = Checks::default();
        if let Some(title) = &self.title {
            c.not_blank("title", title, messages::TITLE_REQUIRED);
            let max = limits.title_max_len;
            c.max_len("title", title.trim(), max, messages::title_too_long(max));
        }
        c.finish()
    }
}

/// Full schedule with its comments in creation order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub id: Uuid,
    pub title: String,
    pub contents: String,
    /// Author's username.
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub comments: Vec<CommentResponse>,
}

impl ScheduleResponse {
    pub fn new(row: ScheduleRow, comments: Vec<CommentResponse>) -> Self {
        Self {
            id: row.id,
            title: row.title,
            contents: row.contents,
            name: row.owner_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            comments,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub id: Uuid,
    pub title: String,
    pub contents: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub comment_count: i64,
}

impl From<ScheduleSummaryRow> for ScheduleSummary {
    fn from(r: ScheduleSummaryRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            contents: r.contents,
            name: r.owner_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
            comment_count: r.comment_count,
        }
    }
}

/// `?pageNum&pageSize`; `pageNum` is 1-based.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;

    /// Returns `(page_num, page_size)` after applying defaults and limits.
    pub fn resolve(&self, limits: &Limits) -> Result<(u32, u32), AppError> {
        let page_num = self.page_num.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(Self::DEFAULT_PAGE_SIZE);
        let mut c = Checks::default();
        if page_num < 1 {
            c.fail("pageNum", messages::PAGE_NUM_INVALID);
        }
        if page_size < 1 || page_size > limits.page_size_max {
            c.fail("pageSize", messages::page_size_invalid(limits.page_size_max));
        }
        c.finish().map_err(AppError::Validation)?;
        Ok((page_num, page_size))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page_num: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> PageResponse<T> {
    pub fn new(items: Vec<T>, page_num: u32, page_size: u32, total_items: i64) -> Self {
        let size = i64::from(page_size.max(1));
        Self {
            items,
            page_num,
            page_size,
            total_items,
            total_pages: (total_items + size - 1) / size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults() {
        let q = PageQuery {
            page_num: None,
            page_size: None,
        };
        assert_eq!(q.resolve(&Limits::default()).unwrap(), (1, 10));
    }

    #[test]
    fn page_query_rejects_zero_and_oversize() {
        let q = PageQuery {
            page_num: Some(0),
            page_size: Some(1000),
        };
        match q.resolve(&Limits::default()).unwrap_err() {
            AppError::Validation(fields) => {
                assert!(fields.contains_key("pageNum"));
                assert!(fields.contains_key("pageSize"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn total_pages_rounds_up() {
        let page: PageResponse<()> = PageResponse::new(vec![], 2, 10, 15);
        assert_eq!(page.total_pages, 2);
        let empty: PageResponse<()> = PageResponse::new(vec![], 1, 10, 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn title_limit_applies_to_updates() {
        let req = UpdateScheduleRequest {
            title: Some("way too long title".into()),
            contents: None,
        };
        assert!(req.validate(&Limits::default()).is_err());
        let ok = UpdateScheduleRequest {
            title: None,
            contents: Some(String::new()),
        };
        assert!(ok.validate(&Limits::default()).is_ok());
    }
}
