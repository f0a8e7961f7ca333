//! Job submission parsing
//!
//! Two request shapes are accepted. A JSON body is an object holding the
//! input fields plus a `_workflow` field with the step list. A multipart form
//! carries files (base64-encoded into the input) and text fields, where a
//! field is treated as JSON when flagged by an `X-Content-Type-<field>`
//! header or by a name prefix (`$` unless overridden via the
//! `X-Content-Type-JSON-prefix` header).

use axum::extract::multipart::Multipart;
use axum::http::HeaderMap;
use base64::Engine;
use serde_json::{json, Map, Value};

use crate::domain::Workflow;

use super::types::ApiError;

const WORKFLOW_FIELD: &str = "_workflow";
const FILE_NAME_FIELD: &str = "fileName";
const FILE_CONTENT_FIELD: &str = "content";
const FILE_ARRAY_FIELD: &str = "files";
const JSON_PREFIX_HEADER: &str = "X-Content-Type-JSON-prefix";
const JSON_FIELD_HEADER_PREFIX: &str = "X-Content-Type-";
const JSON_CONTENT_TYPE: &str = "application/json";
const DEFAULT_JSON_FIELD_PREFIX: &str = "$";

/// Parse a JSON submission: the `_workflow` field becomes the workflow, the
/// rest of the object becomes the input document.
pub fn parse_json(body: &[u8]) -> Result<(Workflow, Value), ApiError> {
    let text = std::str::from_utf8(body).map_err(|_| ApiError::bad_request("Invalid JSON format"))?;
    if text.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Request body cannot be empty, and must be a valid JSON object",
        ));
    }

    let parsed: Value = serde_json::from_str(text)
        .map_err(|_| ApiError::bad_request("Invalid JSON format"))?;

    let Value::Object(mut input) = parsed else {
        return Err(missing_workflow_field());
    };
    let Some(workflow_value) = input.remove(WORKFLOW_FIELD) else {
        return Err(missing_workflow_field());
    };

    let mut workflow: Workflow = serde_json::from_value(workflow_value).map_err(|_| {
        ApiError::bad_request(format!("Invalid JSON format in '{}' field", WORKFLOW_FIELD))
    })?;

    finalize(&mut workflow)?;
    Ok((workflow, Value::Object(input)))
}

/// Parse a multipart submission into a workflow and an input document
pub async fn parse_multipart(
    headers: &HeaderMap,
    mut multipart: Multipart,
) -> Result<(Workflow, Value), ApiError> {
    let json_prefix = json_field_prefix(headers)?;

    let mut workflow = Workflow::default();
    let mut workflow_seen = false;
    let mut input = Map::new();
    let mut files: Vec<(String, String)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        if let Some(file_name) = file_name {
            let bytes = field.bytes().await.map_err(|e| {
                ApiError::bad_request(format!("Failed to read file '{}': {}", file_name, e))
            })?;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
            files.push((file_name, encoded));
            continue;
        }

        // Text fields named like the file array are reserved
        if name == FILE_ARRAY_FIELD {
            continue;
        }

        let text = field.text().await.map_err(|e| {
            ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
        })?;

        // Workflow definition, always JSON encoded
        if name == WORKFLOW_FIELD {
            if workflow_seen {
                return Err(ApiError::bad_request(format!(
                    "Only one '{}' field is allowed",
                    WORKFLOW_FIELD
                )));
            }
            workflow_seen = true;
            workflow = serde_json::from_str(&text).map_err(|_| {
                ApiError::bad_request(format!("Invalid JSON format in '{}' field", WORKFLOW_FIELD))
            })?;
            continue;
        }

        if is_json_field(headers, &name) {
            input.insert(name.clone(), parse_json_field(&name, &text)?);
            continue;
        }

        if let Some(stripped) = name.strip_prefix(&json_prefix) {
            input.insert(stripped.to_string(), parse_json_field(&name, &text)?);
            continue;
        }

        input.insert(name, Value::String(text));
    }

    if let [(file_name, content)] = files.as_slice() {
        input.insert(FILE_NAME_FIELD.to_string(), Value::String(file_name.clone()));
        input.insert(FILE_CONTENT_FIELD.to_string(), Value::String(content.clone()));
    } else if files.len() > 1 {
        let array = files
            .into_iter()
            .map(|(file_name, content)| {
                json!({ FILE_NAME_FIELD: file_name, FILE_CONTENT_FIELD: content })
            })
            .collect();
        input.insert(FILE_ARRAY_FIELD.to_string(), Value::Array(array));
    }

    finalize(&mut workflow)?;
    Ok((workflow, Value::Object(input)))
}

fn finalize(workflow: &mut Workflow) -> Result<(), ApiError> {
    workflow.assign_job_id();
    workflow.assign_step_ids().map_err(ApiError::bad_request)
}

fn missing_workflow_field() -> ApiError {
    ApiError::bad_request(format!(
        "JSON must contain a '{}' field describing the operations to execute",
        WORKFLOW_FIELD
    ))
}

fn parse_json_field(name: &str, text: &str) -> Result<Value, ApiError> {
    serde_json::from_str(text)
        .map_err(|_| ApiError::bad_request(format!("Invalid JSON format in '{}' field", name)))
}

fn is_json_field(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get(format!("{}{}", JSON_FIELD_HEADER_PREFIX, name))
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.to_ascii_lowercase().starts_with(JSON_CONTENT_TYPE)
        })
}

fn json_field_prefix(headers: &HeaderMap) -> Result<String, ApiError> {
    let Some(value) = headers.get(JSON_PREFIX_HEADER) else {
        return Ok(DEFAULT_JSON_FIELD_PREFIX.to_string());
    };

    let prefix = value.to_str().unwrap_or_default().trim();
    if prefix.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Invalid value in '{}' header, the value cannot be empty",
            JSON_PREFIX_HEADER
        )));
    }

    Ok(prefix.to_string())
}
