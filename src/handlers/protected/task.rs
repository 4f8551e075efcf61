// handlers/protected/task.rs - /api/task handlers

use axum::extract::{Path, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{Task, TaskList};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::validation::{parse_id, Validate, ValidatedJson, ValidationErrors};

use super::ownership::load_owned;

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    #[serde(default)]
    pub text: String,
}

impl Validate for TaskRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("text", &self.text);
        errors.finish()
    }
}

async fn save(state: &AppState, task: &Task) -> Result<Task, ApiError> {
    state
        .store
        .save_task(task)
        .await?
        .ok_or_else(|| ApiError::not_found("No task found with the provided ID"))
}

/// POST /api/task/:list_id - add a task to one of the caller's lists
pub async fn task_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(list_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<TaskRequest>,
) -> ApiResult<Task> {
    let list_id = parse_id(&list_id, "task list")?;
    let list: TaskList = load_owned(state.store.as_ref(), list_id, auth).await?;

    let task = state.store.insert_task(list.id, &payload.text).await?;
    tracing::info!(user_id = auth.user_id, task_id = task.id, "Task added");
    Ok(ApiResponse::created("Task added successfully", task))
}

/// PATCH /api/task/:task_id - edit text
pub async fn task_patch(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<TaskRequest>,
) -> ApiResult<Task> {
    let task_id = parse_id(&task_id, "task")?;
    let mut task: Task = load_owned(state.store.as_ref(), task_id, auth).await?;

    task.text = payload.text;
    let task = save(&state, &task).await?;

    tracing::info!(user_id = auth.user_id, task_id = task.id, "Task updated");
    Ok(ApiResponse::ok("Task name updated successfully", task))
}

/// DELETE /api/task/:task_id
pub async fn task_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<String>,
) -> ApiResult<()> {
    let task_id = parse_id(&task_id, "task")?;
    let task: Task = load_owned(state.store.as_ref(), task_id, auth).await?;

    if !state.store.delete_task(task.id).await? {
        return Err(ApiError::not_found("No task found with the provided ID"));
    }

    tracing::info!(user_id = auth.user_id, task_id = task.id, "Task deleted");
    Ok(ApiResponse::empty("Task successfully deleted"))
}

/// PATCH /api/task/:task_id/toggle - flip `completed`
pub async fn task_toggle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<String>,
) -> ApiResult<Task> {
    let task_id = parse_id(&task_id, "task")?;
    let mut task: Task = load_owned(state.store.as_ref(), task_id, auth).await?;

    task.completed = !task.completed;
    let task = save(&state, &task).await?;

    tracing::info!(
        user_id = auth.user_id,
        task_id = task.id,
        completed = task.completed,
        "Task toggled"
    );
    Ok(ApiResponse::ok("Task completed status toggled", task))
}
