use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Success envelope: `{"status": "success", "message": ..., "data": ...}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    pub data: T,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(message, data, StatusCode::OK)
    }

    /// 201 Created
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(message, data, StatusCode::CREATED)
    }

    pub fn with_status(message: impl Into<String>, data: T, status_code: StatusCode) -> Self {
        Self {
            message: message.into(),
            data,
            status_code,
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload; `data` serializes as null
    pub fn empty(message: impl Into<String>) -> Self {
        Self::ok(message, ())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "status": "error",
                        "message": "Failed to serialize response data",
                        "data": null,
                    })),
                )
                    .into_response();
            }
        };

        let envelope = json!({
            "status": "success",
            "message": self.message,
            "data": data,
        });

        (self.status_code, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
