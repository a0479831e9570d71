// handlers/protected/archive.rs - GET /archive handler

use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;
use crate::database::Tab;
use crate::middleware::{ApiResponse, ApiResult, Principal};
use crate::services::tab_service::DEFAULT_LIMIT;

#[derive(Debug, Serialize)]
pub struct Archive {
    pub tabs: Vec<Tab>,
}

/// GET /archive - the caller's most recently seen tabs.
///
/// Answers `{"status": "success", "tabs": [...]}`.
pub async fn archive_get(State(state): State<AppState>, principal: Principal) -> ApiResult<Archive> {
    let tabs = state.tabs.list(&principal.user, DEFAULT_LIMIT, 0).await?;
    Ok(ApiResponse::success(Archive { tabs }))
}
