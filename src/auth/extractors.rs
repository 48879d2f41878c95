use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use super::{dto::Principal, session::SessionContext};
use crate::error::AppError;

/// Request gate: resolves the session principal or rejects with
/// the login-required error before the handler runs.
pub struct CurrentUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = SessionContext::from_request_parts(parts, state).await?;
        match session.principal().await? {
            Some(principal) => Ok(CurrentUser(principal)),
            None => {
                debug!(uri = %parts.uri, "anonymous request to protected route");
                Err(AppError::Unauthenticated)
            }
        }
    }
}
