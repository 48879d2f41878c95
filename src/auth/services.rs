use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::UserResponse,
        password::{hash_password_blocking, verify_dummy_blocking, verify_password_blocking},
        repo::UserRepo,
        repo_types::{NewUser, UserChanges},
    },
    error::AppError,
    messages::{self, BAD_CREDENTIALS, WRONG_PASSWORD},
};

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn sign_up(
    users: &dyn UserRepo,
    username: &str,
    raw_password: &str,
    email: &str,
) -> Result<UserResponse, AppError> {
    let email = normalize_email(email);
    if users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict(messages::EMAIL_TAKEN.into()));
    }

    let password_hash = hash_password_blocking(raw_password.to_string()).await?;
    // The unique index still catches a concurrent sign-up with the same email.
    let user = users
        .insert(NewUser {
            username: username.trim().to_string(),
            email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, "user signed up");
    Ok(UserResponse::from(&user))
}

pub async fn login(
    users: &dyn UserRepo,
    email: &str,
    raw_password: &str,
) -> Result<UserResponse, AppError> {
    let email = normalize_email(email);
    let Some(user) = users.find_by_email(&email).await? else {
        verify_dummy_blocking(raw_password.to_string()).await?;
        warn!(%email, "login unknown email");
        return Err(AppError::Authentication(BAD_CREDENTIALS.into()));
    };

    if !verify_password_blocking(raw_password.to_string(), user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Authentication(BAD_CREDENTIALS.into()));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(UserResponse::from(&user))
}

/// Changes only what is provided; the current password is always checked.
pub async fn update_credentials(
    users: &dyn UserRepo,
    user_id: Uuid,
    new_username: Option<&str>,
    old_raw_password: &str,
    new_raw_password: Option<&str>,
) -> Result<UserResponse, AppError> {
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(messages::not_found(user_id)))?;

    if !verify_password_blocking(old_raw_password.to_string(), user.password_hash.clone()).await? {
        warn!(%user_id, "credentials update with wrong password");
        return Err(AppError::Authentication(WRONG_PASSWORD.into()));
    }

    let password_hash = match new_raw_password {
        Some(p) => Some(hash_password_blocking(p.to_string()).await?),
        None => None,
    };
    let changes = UserChanges {
        username: new_username.map(|u| u.trim().to_string()),
        password_hash,
    };

    let updated = users
        .update(user_id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(messages::not_found(user_id)))?;
    info!(%user_id, "credentials updated");
    Ok(UserResponse::from(&updated))
}

/// Deletes the account with all of its schedules and their comments.
pub async fn delete_account(users: &dyn UserRepo, user_id: Uuid) -> Result<(), AppError> {
    if !users.delete_cascade(user_id).await? {
        return Err(AppError::NotFound(messages::not_found(user_id)));
    }
    info!(%user_id, "account deleted");
    Ok(())
}
