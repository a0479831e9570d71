// handlers/public/home.rs - GET / landing page

use axum::{extract::State, response::Html};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::Principal;

/// GET / - archive-wide tab and user counts.
///
/// Anonymous callers are welcome; a valid bearer token only adds a greeting.
pub async fn home(
    State(state): State<AppState>,
    principal: Option<Principal>,
) -> Result<Html<String>, ApiError> {
    let tab_count = state.tabs.count().await?;
    let user_count = state.users.count().await?;

    let hello = principal
        .as_ref()
        .and_then(|p| p.user.display_name.as_deref())
        .map(greeting)
        .unwrap_or_default();

    Ok(Html(render(tab_count, user_count, &hello)))
}

fn greeting(name: &str) -> String {
    format!("<p>Hello, {}.</p>\n", html_escape::encode_text(name))
}

fn render(tab_count: i64, user_count: i64, greeting: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Tab Archive</title>
</head>
<body>
<h1>Tab Archive</h1>
{greeting}<p>{tab_count} tabs archived by {user_count} users.</p>
</body>
</html>
"#
    )
}
