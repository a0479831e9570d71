// handlers/protected/hook.rs - POST /hook handler

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header::CONTENT_TYPE, HeaderMap},
};
use tracing::{debug, info};

use crate::app::AppState;
use crate::database::Tab;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Principal};

/// POST /hook - archive one tab for the caller.
///
/// Body: `{"url": "...", "title": "...", "favicon": "...", "seen": "<RFC 3339>"}`
/// with `Content-Type: application/json`. Answers `{"status": "success"}`.
pub async fn hook_post(
    State(state): State<AppState>,
    principal: Principal,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<()> {
    if !is_json_content_type(&headers) {
        return Err(ApiError::bad_request("expected 'application/json' content type"));
    }
    let body = body?;

    debug!(bytes = body.len(), "attempting to parse");
    let tab = Tab::from_json(&body).map_err(ApiError::invalid_json)?;

    state.tabs.append(&principal.user, &tab).await?;
    info!(user_id = principal.user.id, url = %tab.url, "tab archived");

    Ok(ApiResponse::ok())
}

/// `application/json`, optionally with parameters such as `charset`
fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}
