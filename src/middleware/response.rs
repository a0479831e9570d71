use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Successful JSON response: the payload's fields merged with `"status": "success"`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with a 200 status
    pub fn success(data: T) -> Self {
        Self { data }
    }
}

impl ApiResponse<()> {
    /// `{"status":"success"}` with nothing else
    pub fn ok() -> Self {
        Self::success(())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to serialize response data" })),
                )
                    .into_response();
            }
        };

        (StatusCode::OK, Json(envelope(data_value))).into_response()
    }
}

fn envelope(data: Value) -> Value {
    match data {
        Value::Object(mut fields) => {
            fields.insert("status".to_string(), Value::String("success".to_string()));
            Value::Object(fields)
        }
        Value::Null => json!({ "status": "success" }),
        other => json!({ "status": "success", "data": other }),
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
