use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::ApiError,
    response::ApiResponse,
    state::AppState,
    tasks::dto::{
        CreateTaskRequest, TaskFilter, TaskView, UpdateTaskRequest, UpdateTaskStatusRequest,
    },
    tasks::services,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/user", get(list_own_tasks))
        .route("/tasks/user/:id", get(list_user_tasks))
        .route("/tasks/:id", get(get_task))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task))
        .route("/tasks/:id", post(update_task).delete(delete_task))
        .route("/tasks/:id/status", post(update_task_status))
}

#[instrument(skip(state, _caller))]
pub async fn list_tasks(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<ApiResponse<Vec<TaskView>>>, ApiError> {
    let tasks = services::list_tasks(&state.db, &filter).await?;
    Ok(Json(ApiResponse::success(
        tasks,
        "Tasks fetched successfully",
    )))
}

#[instrument(skip(state, caller))]
pub async fn list_own_tasks(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(mut filter): Query<TaskFilter>,
) -> Result<Json<ApiResponse<Vec<TaskView>>>, ApiError> {
    filter.owner = Some(caller.0.id);
    let tasks = services::list_tasks(&state.db, &filter).await?;
    Ok(Json(ApiResponse::success(
        tasks,
        "Tasks fetched successfully",
    )))
}

#[instrument(skip(state, _caller))]
pub async fn list_user_tasks(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(owner_id): Path<Uuid>,
    Query(mut filter): Query<TaskFilter>,
) -> Result<Json<ApiResponse<Vec<TaskView>>>, ApiError> {
    filter.owner = Some(owner_id);
    let tasks = services::list_tasks(&state.db, &filter).await?;
    Ok(Json(ApiResponse::success(
        tasks,
        "Tasks fetched successfully",
    )))
}

#[instrument(skip(state, _caller))]
pub async fn get_task(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TaskView>>, ApiError> {
    let task = services::get_task(&state.db, id).await?;
    Ok(Json(ApiResponse::success(
        task,
        "Task fetched successfully",
    )))
}

#[instrument(skip(state, caller, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TaskView>>), ApiError> {
    payload.validate()?;
    let task = services::create_task(&state.db, &state.events, caller.0.id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(task, "Task created successfully")),
    ))
}

#[instrument(skip(state, caller, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<ApiResponse<TaskView>>, ApiError> {
    payload.validate()?;
    let task = services::update_task(&state.db, &state.events, id, caller.0.id, payload).await?;
    Ok(Json(ApiResponse::success(
        task,
        "Task updated successfully",
    )))
}

#[instrument(skip(state, caller, payload))]
pub async fn update_task_status(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskStatusRequest>,
) -> Result<Json<ApiResponse<TaskView>>, ApiError> {
    let task =
        services::update_task_status(&state.db, &state.events, id, caller.0.id, payload.status)
            .await?;
    Ok(Json(ApiResponse::success(
        task,
        "Task status updated successfully",
    )))
}

#[instrument(skip(state, caller))]
pub async fn delete_task(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TaskView>>, ApiError> {
    let task = services::delete_task(&state.db, &state.events, id, caller.0.id).await?;
    Ok(Json(ApiResponse::success(
        task,
        "Task deleted successfully",
    )))
}
