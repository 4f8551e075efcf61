use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::Claims;
use crate::error::ApiError;

/// Identity of the caller, taken from a verified bearer token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
        }
    }
}

/// Bearer token middleware for every protected route.
///
/// A missing header or a non-bearer credential answers 400. A token that
/// fails to decode, is expired, or names a user that no longer exists
/// answers 401. On success the [`AuthUser`] is stored in the request
/// extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let claims = state.tokens.verify_header(header).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::from(e)
    })?;

    if state.store.find_user(claims.user_id).await?.is_none() {
        tracing::debug!(user_id = claims.user_id, "Rejected token of a deleted user");
        return Err(ApiError::unauthorized("Invalid or expired JWT"));
    }

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired JWT"))
    }
}
