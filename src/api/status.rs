//! Operator-facing status endpoints

use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::infrastructure::logging::redact_path;

use super::state::AppState;

#[derive(Serialize)]
pub struct ToolsResponse {
    pub tools: BTreeMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvResponse {
    pub workspace_dir: String,
    pub version: String,
    pub os: String,
    pub arch: String,
    pub process_id: u32,
}

/// The registered tool endpoints. Always served fresh so operators see what
/// the dispatcher is actually using.
pub async fn tools(State(state): State<AppState>) -> Response {
    let tools: BTreeMap<String, String> = state
        .tools
        .iter()
        .map(|(name, url)| (name.clone(), url.clone()))
        .collect();

    let mut response = Json(ToolsResponse { tools }).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}

/// Deployment environment details, with filesystem paths scrubbed
pub async fn env_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(EnvResponse {
        workspace_dir: redact_path(&state.workspace_dir),
        version: env!("CARGO_PKG_VERSION").to_string(),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        process_id: std::process::id(),
    })
}
