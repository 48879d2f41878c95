use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Only the recorded owner may mutate a resource.
pub fn authorize(resource_owner_id: Uuid, principal_id: Uuid) -> Decision {
    if resource_owner_id == principal_id {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// [`authorize`] as a guard: `Deny` becomes a 403 carrying `denied`.
pub fn ensure_owner(
    resource_owner_id: Uuid,
    principal_id: Uuid,
    denied: &str,
) -> Result<(), AppError> {
    match authorize(resource_owner_id, principal_id) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::warn!(%resource_owner_id, %principal_id, "ownership check denied");
            Err(AppError::Forbidden(denied.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages;

    #[test]
    fn owner_is_allowed() {
        let id = Uuid::new_v4();
        assert_eq!(authorize(id, id), Decision::Allow);
        assert!(ensure_owner(id, id, "nope").is_ok());
    }

    #[test]
    fn anyone_else_is_denied() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert_eq!(authorize(owner, other), Decision::Deny);
        let err = ensure_owner(owner, other, messages::NOT_AUTHOR_DELETE).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == messages::NOT_AUTHOR_DELETE));
    }
}
