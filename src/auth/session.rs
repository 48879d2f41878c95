//! Session helpers keeping handlers free of tower-sessions details.
//!
//! The session holds a single [`Principal`] snapshot under [`PRINCIPAL_KEY`];
//! handlers only see `principal`, `attach` and `invalidate`.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::{auth::dto::Principal, error::AppError};

pub(crate) const PRINCIPAL_KEY: &str = "principal";

/// Per-request handle on the session store.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    pub async fn principal(&self) -> Result<Option<Principal>, AppError> {
        self.0
            .get::<Principal>(PRINCIPAL_KEY)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to read session: {e}")))
    }

    /// Stores `principal`, issuing a fresh session id first.
    pub async fn attach(&self, principal: &Principal) -> Result<(), AppError> {
        self.0
            .cycle_id()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to cycle session: {e}")))?;
        self.0
            .insert(PRINCIPAL_KEY, principal)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to persist session: {e}")))
    }

    /// Drops the session; a no-op when nothing is attached.
    pub async fn invalidate(&self) -> Result<(), AppError> {
        self.0
            .flush()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to flush session: {e}")))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(anyhow::anyhow!("session layer missing: {msg}")))?;
        Ok(SessionContext::new(session))
    }
}
