use axum::{
    extract::State,
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    comments::{dto::CommentRequest, services},
    error::AppError,
    schedules::dto::ScheduleResponse,
    state::AppState,
    validation::{ValidJson, ValidPath},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schedules/:schedule_id", post(create_comment))
        .route(
            "/schedules/:schedule_id/:comment_id",
            put(update_comment).delete(delete_comment),
        )
}

#[instrument(skip(state, principal, body), fields(user_id = %principal.id))]
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ValidPath(schedule_id): ValidPath<Uuid>,
    ValidJson(body): ValidJson<CommentRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>), AppError> {
    let schedule = services::create(&state, schedule_id, principal.id, &body.contents).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

#[instrument(skip(state, principal, body), fields(user_id = %principal.id))]
pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ValidPath((schedule_id, comment_id)): ValidPath<(Uuid, Uuid)>,
    ValidJson(body): ValidJson<CommentRequest>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let schedule =
        services::update(&state, schedule_id, comment_id, principal.id, &body.contents).await?;
    Ok(Json(schedule))
}

#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ValidPath((schedule_id, comment_id)): ValidPath<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    services::delete(&state, schedule_id, comment_id, principal.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
