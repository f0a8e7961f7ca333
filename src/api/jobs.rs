//! Job submission endpoint
//!
//! `POST /api/jobs` runs the workflow synchronously inside the request: the
//! response carries the job's final state on success, or the structured
//! failure details with the mapped status code when the job halts. The
//! `X-Job-Id` header is set as soon as a workflow was parsed, so callers can
//! locate the workspace even for failed jobs.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info};

use crate::domain::{FailureKind, JobFailure};

use super::parser;
use super::state::AppState;
use super::types::ApiError;

pub async fn create_job(State(state): State<AppState>, request: Request) -> Response {
    let headers = request.headers().clone();
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/"));

    let parsed = if is_multipart {
        match Multipart::from_request(request, &()).await {
            Ok(multipart) => parser::parse_multipart(&headers, multipart).await,
            Err(e) => Err(ApiError::bad_request(format!(
                "Failed to read multipart request: {}",
                e
            ))),
        }
    } else {
        match Bytes::from_request(request, &()).await {
            Ok(bytes) => parser::parse_json(&bytes),
            Err(e) => Err(ApiError::bad_request(format!(
                "Failed to read request body: {}",
                e
            ))),
        }
    };

    let (workflow, input) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("An error occurred while parsing the request: {}", e);
            return e.into_response();
        }
    };

    let job_id = workflow.job_id.clone();
    let clock = Instant::now();

    let mut response = match state.orchestrator.run(&workflow, &input).await {
        Ok(final_state) => {
            info!(
                "Job {} completed successfully in {} msecs",
                job_id,
                clock.elapsed().as_millis()
            );
            (StatusCode::OK, Json(final_state)).into_response()
        }
        Err(failure) => failure_response(failure),
    };

    if let Ok(value) = HeaderValue::from_str(&job_id) {
        response.headers_mut().insert("X-Job-Id", value);
    }

    response
}

fn failure_response(failure: JobFailure) -> Response {
    error!("{}", failure);

    let status = match failure.kind {
        FailureKind::BadRequest => StatusCode::BAD_REQUEST,
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(failure.details)).into_response()
}
