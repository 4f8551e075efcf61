// handlers/protected/tasklist.rs - /api/tasklist handlers

use axum::extract::{Path, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{TaskList, TaskListWithTasks};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::validation::{parse_id, Validate, ValidatedJson, ValidationErrors};

use super::ownership::load_owned;

#[derive(Debug, Deserialize)]
pub struct ListRequest {
    #[serde(default)]
    pub name: String,
}

impl Validate for ListRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("name", &self.name);
        errors.finish()
    }
}

/// GET /api/tasklist/ - caller's lists, each with its tasks
pub async fn lists_get(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Vec<TaskListWithTasks>> {
    let lists = state.store.lists_for_user(auth.user_id).await?;
    Ok(ApiResponse::ok("Lists retrieved successfully", lists))
}

/// POST /api/tasklist/ - create an empty list
pub async fn list_create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<ListRequest>,
) -> ApiResult<TaskListWithTasks> {
    let list = state.store.insert_list(auth.user_id, &payload.name).await?;
    tracing::info!(user_id = auth.user_id, list_id = list.id, "Task list created");
    Ok(ApiResponse::created(
        "List created successfully",
        TaskListWithTasks::empty(list),
    ))
}

/// PATCH /api/tasklist/:list_id - rename
pub async fn list_patch(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(list_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<ListRequest>,
) -> ApiResult<TaskList> {
    let list_id = parse_id(&list_id, "task list")?;
    let mut list: TaskList = load_owned(state.store.as_ref(), list_id, auth).await?;

    list.name = payload.name;
    let list = state
        .store
        .save_list(&list)
        .await?
        .ok_or_else(|| ApiError::not_found("No task list found with the provided ID"))?;

    tracing::info!(user_id = auth.user_id, list_id = list.id, "Task list renamed");
    Ok(ApiResponse::ok("List name updated successfully", list))
}

/// DELETE /api/tasklist/:list_id - soft-delete; its tasks become unreachable
pub async fn list_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(list_id): Path<String>,
) -> ApiResult<()> {
    let list_id = parse_id(&list_id, "task list")?;
    let list: TaskList = load_owned(state.store.as_ref(), list_id, auth).await?;

    if !state.store.delete_list(list.id).await? {
        return Err(ApiError::not_found("No task list found with the provided ID"));
    }

    tracing::info!(user_id = auth.user_id, list_id = list.id, "Task list deleted");
    Ok(ApiResponse::empty("Task list successfully deleted"))
}
