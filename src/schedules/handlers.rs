use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    schedules::{
        dto::{
            CreateScheduleRequest, PageQuery, PageResponse, ScheduleResponse, ScheduleSummary,
            UpdateScheduleRequest,
        },
        services,
    },
    state::AppState,
    validation::{ValidJson, ValidPath, ValidQuery},
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/schedules", get(list_schedules))
        .route("/schedules/pages", get(page_schedules))
        .route("/schedules/:schedule_id", get(get_schedule))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/schedules", post(create_schedule))
        .route("/schedules/myschedules", get(my_schedules))
        .route("/schedules/:schedule_id", put(update_schedule).delete(delete_schedule))
}

#[instrument(skip(state, principal, body))]
pub async fn create_schedule(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ValidJson(body): ValidJson<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>), AppError> {
    let created = services::create(&state, principal.id, &body.title, &body.contents).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
pub async fn list_schedules(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScheduleSummary>>, AppError> {
    Ok(Json(services::list_all(&state).await?))
}

#[instrument(skip(state))]
pub async fn page_schedules(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<PageQuery>,
) -> Result<Json<PageResponse<ScheduleSummary>>, AppError> {
    let (page_num, page_size) = q.resolve(&state.config.limits)?;
    Ok(Json(services::page(&state, page_num, page_size).await?))
}

#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn my_schedules(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<Vec<ScheduleSummary>>, AppError> {
    Ok(Json(services::list_mine(&state, principal.id).await?))
}

#[instrument(skip(state))]
pub async fn get_schedule(
    State(state): State<AppState>,
    ValidPath(schedule_id): ValidPath<Uuid>,
) -> Result<Json<ScheduleResponse>, AppError> {
    Ok(Json(services::get(&state, schedule_id).await?))
}

#[instrument(skip(state, principal, body), fields(user_id = %principal.id))]
pub async fn update_schedule(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ValidPath(schedule_id): ValidPath<Uuid>,
    ValidJson(body): ValidJson<UpdateScheduleRequest>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let updated = services::update(
        &state,
        schedule_id,
        principal.id,
        body.title.as_deref(),
        body.contents.as_deref(),
    )
    .await?;
    Ok(Json(updated))
}

#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn delete_schedule(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ValidPath(schedule_id): ValidPath<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete(&state, schedule_id, principal.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
