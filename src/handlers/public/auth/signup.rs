// handlers/public/auth/signup.rs - POST /api/auth/signup handler

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::NewUser;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{trim_in_place, Validate, ValidatedJson, ValidationErrors};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Defaults to the username
    pub name: Option<String>,
    pub occupation: Option<String>,
    pub about: Option<String>,
}

impl Validate for SignupRequest {
    fn normalize(&mut self) {
        trim_in_place(&mut self.username);
        trim_in_place(&mut self.email);
        if let Some(name) = self.name.as_mut() {
            trim_in_place(name);
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .length("username", &self.username, 3, 50)
            .email("email", &self.email)
            .length("password", &self.password, 6, 50);
        if let Some(name) = &self.name {
            errors.length("name", name, 3, 50);
        }
        errors.finish()
    }
}

/// Public part of a freshly created account
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// POST /api/auth/signup - Create an account
///
/// ```json
/// { "username": "ada", "email": "ada@example.com", "password": "secret1" }
/// ```
///
/// 409 when the username or email is already taken.
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> ApiResult<SignupResponse> {
    if state
        .store
        .identity_taken(&payload.username, &payload.email, None)
        .await?
    {
        return Err(ApiError::conflict("Username or email already exists"));
    }

    let password = state.passwords.hash(&payload.password).await?;
    let user = state
        .store
        .insert_user(NewUser {
            name: payload.name.unwrap_or_else(|| payload.username.clone()),
            username: payload.username,
            email: payload.email,
            password,
            occupation: payload.occupation.unwrap_or_default(),
            about: payload.about.unwrap_or_default(),
        })
        .await?;

    tracing::info!(user_id = user.id, "Created user");

    Ok(ApiResponse::created(
        "Created user",
        SignupResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_fields_and_bad_email_are_reported() {
        let req: SignupRequest = serde_json::from_value(serde_json::json!({
            "username": "ab",
            "email": "not-an-email",
            "password": "12345",
            "name": "Al",
        }))
        .unwrap();
        let errors = req.validate().unwrap_err().into_inner();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["username", "email", "password", "name"]);
    }

    #[test]
    fn name_is_optional() {
        let req: SignupRequest = serde_json::from_value(serde_json::json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "secret1",
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn username_and_email_are_trimmed() {
        let mut req: SignupRequest = serde_json::from_value(serde_json::json!({
            "username": " ada ",
            "email": "ada@example.com\n",
            "password": "secret1",
            "name": "  Ada  ",
        }))
        .unwrap();
        req.normalize();
        assert!(req.validate().is_ok());
        assert_eq!(req.username, "ada");
        assert_eq!(req.email, "ada@example.com");
        assert_eq!(req.name.as_deref(), Some("Ada"));
    }
}
