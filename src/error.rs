use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Request,
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::error;

use crate::messages;

/// Field name → human readable message.
pub type FieldErrors = BTreeMap<String, String>;

/// Failures raised by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let unique = e
            .as_database_error()
            .map(|d| d.is_unique_violation())
            .unwrap_or(false);
        if unique {
            StoreError::Conflict(messages::EMAIL_TAKEN.into())
        } else {
            StoreError::Backend(e.into())
        }
    }
}

/// Every domain failure a handler can surface, mapped to one HTTP status each.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{}", messages::LOGIN_REQUIRED)]
    Unauthenticated,
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated | AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(messages::bad_request(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(messages::bad_request(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(messages::bad_request(rejection.body_text()))
    }
}

/// Body of every handled, non-validation error.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub message: String,
    pub status: u16,
    pub path: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Validation(fields) => return (status, Json(fields)).into_response(),
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                messages::INTERNAL.to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            timestamp: OffsetDateTime::now_utc(),
            message,
            status: status.as_u16(),
            path: String::new(),
        };
        let mut res = (status, Json(body.clone())).into_response();
        res.extensions_mut().insert(body);
        res
    }
}

/// Re-renders error bodies with the path of the request that produced them.
pub async fn attach_error_path(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let mut res = next.run(req).await;
    match res.extensions_mut().remove::<ErrorBody>() {
        Some(mut body) => {
            body.path = path;
            (res.status(), Json(body)).into_response()
        }
        None => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(field: &str, message: &str) -> AppError {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), message.to_string());
        AppError::Validation(fields)
    }

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(invalid("email", "bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Authentication("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_conflict_becomes_conflict() {
        let e: AppError = StoreError::Conflict("taken".into()).into();
        assert!(matches!(e, AppError::Conflict(ref m) if m == "taken"));
    }

    #[tokio::test]
    async fn internal_errors_are_not_leaked() {
        let res = AppError::Internal(anyhow::anyhow!("db password is hunter2")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(text.contains(messages::INTERNAL));
    }

    #[tokio::test]
    async fn validation_renders_field_map() {
        let res = invalid("title", "title is required").into_response();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["title"], "title is required");
        assert!(json.get("status").is_none());
    }
}
