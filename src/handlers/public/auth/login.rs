// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{is_email, Validate, ValidatedJson, ValidationErrors};

const BAD_CREDENTIALS: &str = "Invalid identity or password";

/// Accepts `identity`, or `email`/`username` as aliases
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identity: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// First non-empty of `identity`, `email`, `username`
    pub fn identity(&self) -> &str {
        [&self.identity, &self.email, &self.username]
            .into_iter()
            .flatten()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .unwrap_or("")
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .required("identity", self.identity())
            .required("password", &self.password);
        errors.finish()
    }
}

/// POST /api/auth/login - Authenticate and receive a bearer token
///
/// ```json
/// { "identity": "ada@example.com", "password": "secret1" }
/// ```
///
/// `data` is the signed token. Unknown identities and wrong passwords get the
/// same 401 so the response never reveals whether an account exists.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<String> {
    let identity = payload.identity();

    let Some(user) = find_by_identity(&state, identity).await? else {
        state.passwords.verify_dummy(&payload.password).await?;
        tracing::warn!("Login rejected: unknown identity");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    };

    if !state.passwords.verify(&payload.password, &user.password).await? {
        tracing::warn!(user_id = user.id, "Login rejected: wrong password");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }

    let token = state.tokens.issue(user.id)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(ApiResponse::ok("Success login", token))
}

async fn find_by_identity(state: &AppState, identity: &str) -> Result<Option<User>, ApiError> {
    let user = if is_email(identity) {
        state.store.find_user_by_email(identity).await?
    } else {
        state.store.find_user_by_username(identity).await?
    };
    Ok(user)
}
