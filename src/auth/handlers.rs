use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, Principal, SignUpRequest, UpdateUserRequest, UserResponse},
        extractors::CurrentUser,
        services,
        session::SessionContext,
    },
    error::AppError,
    messages,
    ownership::ensure_owner,
    state::AppState,
    validation::{ValidJson, ValidPath},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/signup", post(sign_up))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(current_user))
        .route("/users/:user_id", patch(update_user).delete(delete_user))
}

#[instrument(skip(state, body))]
pub async fn sign_up(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<SignUpRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user =
        services::sign_up(state.users.as_ref(), &body.username, &body.password, &body.email)
            .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: SessionContext,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::login(state.users.as_ref(), &body.email, &body.password).await?;
    session.attach(&Principal::from(&user)).await?;
    Ok(Json(user))
}

#[instrument(skip(session))]
pub async fn logout(session: SessionContext) -> Result<StatusCode, AppError> {
    if let Some(principal) = session.principal().await? {
        info!(user_id = %principal.id, "user logged out");
    }
    session.invalidate().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
pub async fn current_user(CurrentUser(principal): CurrentUser) -> Json<Principal> {
    Json(principal)
}

#[instrument(skip(state, session, principal, body))]
pub async fn update_user(
    State(state): State<AppState>,
    session: SessionContext,
    CurrentUser(principal): CurrentUser,
    ValidPath(user_id): ValidPath<Uuid>,
    ValidJson(body): ValidJson<UpdateUserRequest>,
) -> Result<StatusCode, AppError> {
    ensure_owner(user_id, principal.id, messages::NOT_AUTHOR_UPDATE)?;
    let updated = services::update_credentials(
        state.users.as_ref(),
        user_id,
        body.username.as_deref(),
        body.old_password.as_deref().unwrap_or_default(),
        body.new_password.as_deref(),
    )
    .await?;
    session.attach(&Principal::from(&updated)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, session, principal))]
pub async fn delete_user(
    State(state): State<AppState>,
    session: SessionContext,
    CurrentUser(principal): CurrentUser,
    ValidPath(user_id): ValidPath<Uuid>,
) -> Result<StatusCode, AppError> {
    ensure_owner(user_id, principal.id, messages::NOT_AUTHOR_DELETE)?;
    services::delete_account(state.users.as_ref(), user_id).await?;
    session.invalidate().await?;
    Ok(StatusCode::NO_CONTENT)
}
