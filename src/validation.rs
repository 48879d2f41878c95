//! Request validation run before any handler logic.
//!
//! [`ValidJson`] deserializes a JSON body and runs [`Validate`] against the
//! configured [`Limits`], so services only ever see well-formed input.
//! [`ValidPath`] and [`ValidQuery`] route malformed path segments and query
//! strings through [`AppError`] as well.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::{
    config::Limits,
    error::{AppError, FieldErrors},
    messages,
    state::AppState,
};

pub trait Validate {
    fn validate(&self, limits: &Limits) -> Result<(), FieldErrors>;
}

/// JSON body that has passed [`Validate`].
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value
            .validate(&state.config.limits)
            .map_err(AppError::Validation)?;
        Ok(ValidJson(value))
    }
}

/// Path parameters; a segment that fails to parse is a `BadRequest`.
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ValidPath(value))
    }
}

/// Query string; an unparsable value is a `BadRequest`.
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ValidQuery(value))
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Accumulates per-field messages; the first message for a field wins.
#[derive(Default)]
pub(crate) struct Checks(FieldErrors);

impl Checks {
    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn not_blank(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.fail(field, message);
        }
    }

    /// Length in characters, not bytes.
    pub fn max_len(&mut self, field: &str, value: &str, max: usize, message: String) {
        if value.chars().count() > max {
            self.fail(field, message);
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !value.trim().is_empty() && !is_valid_email(value.trim()) {
            self.fail(field, messages::EMAIL_INVALID);
        }
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@x.com"));
        assert!(!is_valid_email("spaces in@x.com"));
    }

    #[test]
    fn checks_keep_first_message_per_field() {
        let mut c = Checks::default();
        c.not_blank("username", "   ", messages::USERNAME_REQUIRED);
        c.max_len("username", "   ", 1, messages::username_too_long(1));
        let errs = c.finish().unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs["username"], messages::USERNAME_REQUIRED);
    }

    #[test]
    fn max_len_counts_characters() {
        let mut c = Checks::default();
        c.max_len("username", "홍길동", 3, messages::username_too_long(3));
        assert!(c.finish().is_ok());
    }
}
