use axum::extract::State;
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/ - hello
pub async fn api_root() -> ApiResponse<Value> {
    ApiResponse::ok(
        "Hello, world!",
        json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// GET /health - 200 while the store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    if let Err(e) = state.store.ping().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database unavailable"));
    }

    Ok(ApiResponse::ok(
        "Healthy",
        json!({
            "status": "ok",
            "timestamp": Utc::now(),
            "database": "ok",
        }),
    ))
}
