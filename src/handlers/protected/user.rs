// handlers/protected/user.rs - /api/user/:id handlers

use axum::extract::{Path, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::validation::{parse_id, trim_in_place, Validate, ValidatedJson, ValidationErrors};

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub occupation: Option<String>,
    pub about: Option<String>,
}

impl Validate for UpdateUserRequest {
    fn normalize(&mut self) {
        for field in [&mut self.name, &mut self.username, &mut self.email] {
            if let Some(value) = field.as_mut() {
                trim_in_place(value);
            }
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            errors.length("name", name, 3, 50);
        }
        if let Some(username) = &self.username {
            errors.length("username", username, 3, 50);
        }
        if let Some(email) = &self.email {
            errors.email("email", email);
        }
        if let Some(password) = &self.password {
            errors.length("password", password, 6, 50);
        }
        errors.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    #[serde(default)]
    pub password: String,
}

impl Validate for DeleteUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("password", &self.password);
        errors.finish()
    }
}

/// Path id must be the caller's own id
fn own_id(raw: &str, auth: AuthUser, action: &str) -> Result<i64, ApiError> {
    let id = parse_id(raw, "user")?;
    if id != auth.user_id {
        tracing::warn!(user_id = auth.user_id, target_id = id, "Rejected {} of another user", action);
        return Err(ApiError::forbidden(format!(
            "You are not authorized to {} this user",
            action
        )));
    }
    Ok(id)
}

async fn load_user(state: &AppState, id: i64) -> Result<User, ApiError> {
    state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user found with ID"))
}

/// GET /api/user/:id - public profile of any user
pub async fn user_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let id = parse_id(&id, "user")?;
    let user = load_user(&state, id).await?;
    Ok(ApiResponse::ok("User found", user))
}

/// PATCH /api/user/:id - update own profile
pub async fn user_patch(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<User> {
    let id = own_id(&id, auth, "update")?;
    let mut user = load_user(&state, id).await?;

    let identity_changed = payload.username.as_ref().is_some_and(|u| *u != user.username)
        || payload.email.as_ref().is_some_and(|e| *e != user.email);

    if let Some(name) = payload.name {
        user.name = name;
    }
    if let Some(username) = payload.username {
        user.username = username;
    }
    if let Some(email) = payload.email {
        user.email = email;
    }
    if let Some(occupation) = payload.occupation {
        user.occupation = occupation;
    }
    if let Some(about) = payload.about {
        user.about = about;
    }
    if let Some(password) = payload.password {
        user.password = state.passwords.hash(&password).await?;
    }

    if identity_changed
        && state
            .store
            .identity_taken(&user.username, &user.email, Some(user.id))
            .await?
    {
        return Err(ApiError::conflict("Username or email already exists"));
    }

    let user = state
        .store
        .save_user(&user)
        .await?
        .ok_or_else(|| ApiError::not_found("No user found with ID"))?;

    tracing::info!(user_id = user.id, "User updated");
    Ok(ApiResponse::ok("User successfully updated", user))
}

/// DELETE /api/user/:id - soft-delete own account after re-checking the password
pub async fn user_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<DeleteUserRequest>,
) -> ApiResult<()> {
    let id = own_id(&id, auth, "delete")?;
    let user = load_user(&state, id).await?;

    if !state.passwords.verify(&payload.password, &user.password).await? {
        tracing::warn!(user_id = user.id, "Account deletion rejected: wrong password");
        return Err(ApiError::unauthorized("Not valid user"));
    }

    if !state.store.delete_user(user.id).await? {
        return Err(ApiError::not_found("No user found with ID"));
    }

    tracing::info!(user_id = user.id, "User deleted");
    Ok(ApiResponse::empty("User successfully deleted"))
}
