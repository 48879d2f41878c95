use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::User;
use crate::{
    config::Limits,
    error::FieldErrors,
    messages,
    validation::{Checks, Validate},
};

/// Request body for sign-up.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

impl Validate for SignUpRequest {
    fn validate(&self, limits: &Limits) -> Result<(), FieldErrors> {
        let mut c = Checks::default();
        c.not_blank("username", &self.username, messages::USERNAME_REQUIRED);
        let max = limits.username_max_len;
        c.max_len("username", self.username.trim(), max, messages::username_too_long(max));
        c.not_blank("password", &self.password, messages::PASSWORD_REQUIRED);
        c.not_blank("email", &self.email, messages::EMAIL_REQUIRED);
        c.email("email", &self.email);
        c.finish()
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self, _limits: &Limits) -> Result<(), FieldErrors> {
        let mut c = Checks::default();
        c.not_blank("email", &self.email, messages::EMAIL_REQUIRED);
        c.email("email", &self.email);
        c.not_blank("password", &self.password, messages::PASSWORD_REQUIRED);
        c.finish()
    }
}

/// Request body for `PATCH /users/{id}`. Only provided fields change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self, limits: &Limits) -> Result<(), FieldErrors> {
        let mut c = Checks::default();
        c.not_blank(
            "oldPassword",
            self.old_password.as_deref().unwrap_or_default(),
            messages::OLD_PASSWORD_REQUIRED,
        );
        if let Some(username) = &self.username {
            c.not_blank("username", username, messages::USERNAME_REQUIRED);
            let max = limits.username_max_len;
            c.max_len("username", username.trim(), max, messages::username_too_long(max));
        }
        if let Some(new_password) = &self.new_password {
            c.not_blank("newPassword", new_password, messages::NEW_PASSWORD_REQUIRED);
        }
        c.finish()
    }
}

/// Public projection of a user; never carries the hash.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Authenticated principal held in the session for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&UserResponse> for Principal {
    fn from(u: &UserResponse) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, password: &str, email: &str) -> SignUpRequest {
        SignUpRequest {
            username: username.into(),
            password: password.into(),
            email: email.into(),
        }
    }

    #[test]
    fn signup_accepts_valid_input() {
        assert!(signup("alice", "pw1", "a@x.com")
            .validate(&Limits::default())
            .is_ok());
    }

    #[test]
    fn signup_reports_each_bad_field() {
        let errs = signup("toolongname", " ", "nope")
            .validate(&Limits::default())
            .unwrap_err();
        assert!(errs.contains_key("username"));
        assert!(errs.contains_key("password"));
        assert!(errs.contains_key("email"));
    }

    #[test]
    fn login_rejects_malformed_email() {
        let req = LoginRequest {
            email: "not-an-email".into(),
            password: "pw1".into(),
        };
        let errs = req.validate(&Limits::default()).unwrap_err();
        assert_eq!(errs["email"], messages::EMAIL_INVALID);
        assert!(!errs.contains_key("password"));
    }

    #[test]
    fn update_requires_old_password() {
        let req = UpdateUserRequest {
            username: Some("bob".into()),
            old_password: None,
            new_password: None,
        };
        let errs = req.validate(&Limits::default()).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs["oldPassword"], messages::OLD_PASSWORD_REQUIRED);
    }

    #[test]
    fn user_response_uses_camel_case() {
        let now = OffsetDateTime::now_utc();
        let response = UserResponse {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "a@x.com".into(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("password_hash").is_none());
    }
}
