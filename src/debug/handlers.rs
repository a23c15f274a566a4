//! Index, build info and log level handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::buildinfo::{BuildInfo, BUILD_INFO};
use crate::debug::server::{DebugState, COMPONENT};
use crate::observability::Level;

#[derive(Debug, Deserialize)]
struct LevelRequest {
    level: String,
}

#[derive(Debug, Serialize)]
struct LevelResponse {
    level: Level,
}

/// GET / - index page with the level form.
pub async fn index(State(state): State<DebugState>) -> Html<String> {
    Html(state.index.render(state.level.get()))
}

/// GET /version - build information.
pub async fn version() -> Json<BuildInfo> {
    Json(BUILD_INFO)
}

/// GET /log/level - current severity.
pub async fn get_level(State(state): State<DebugState>, headers: HeaderMap) -> Response {
    level_response(state.level.get(), &headers)
}

/// PUT /log/level - change severity.
///
/// The token may arrive as a form (`level=warn`), as JSON
/// (`{"level":"warn"}`) or as a bare text body (`warn`).
pub async fn put_level(State(state): State<DebugState>, headers: HeaderMap, body: Bytes) -> Response {
    let token = match level_token(content_type(&headers), &body) {
        Ok(token) => token,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    let previous = state.level.get();
    match state.level.set(&token) {
        Ok(level) => {
            tracing::info!(target: COMPONENT, from = %previous, to = %level, "log level changed");
            level_response(level, &headers)
        }
        Err(e) => {
            tracing::warn!(target: COMPONENT, token = %token, "rejected log level change");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

fn level_response(level: Level, headers: &HeaderMap) -> Response {
    if accepts_json(headers) {
        Json(LevelResponse { level }).into_response()
    } else {
        level.as_str().into_response()
    }
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

fn level_token(content_type: &str, body: &[u8]) -> Result<String, String> {
    let text = std::str::from_utf8(body).map_err(|_| "body is not valid UTF-8".to_string())?;
    let trimmed = text.trim();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        return form_level(trimmed);
    }
    if content_type.starts_with("application/json") || trimmed.starts_with('{') {
        return serde_json::from_str::<LevelRequest>(trimmed)
            .map(|r| r.level)
            .map_err(|e| format!("invalid JSON body: {e}"));
    }
    if trimmed.contains('=') {
        return form_level(trimmed);
    }
    if trimmed.is_empty() {
        return Err("missing level".to_string());
    }
    Ok(trimmed.to_string())
}

fn form_level(body: &str) -> Result<String, String> {
    url::form_urlencoded::parse(body.as_bytes())
        .find(|(key, _)| key == "level")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| "missing form field \"level\"".to_string())
}
