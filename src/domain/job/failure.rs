//! Structured failure payload for halted jobs
//!
//! A failed job responds with a details object that accumulates position
//! fields (job, step, function) as execution advances, then gains the error
//! fields when something breaks. The whole object is the response body, so an
//! operator can see exactly where the job stopped; the durable context
//! checkpoint holds the data as of that point.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Which HTTP status class a failure maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    BadRequest,
    NotFound,
    Internal,
}

/// Diagnostic payload returned to the caller when a job halts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDetails {
    pub job_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_number: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The offending JMESPath expression, for transform failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    /// Raw (PII-scrubbed) backend response body, for dispatch failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// The response body split into lines, readable without JSON unescaping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_lines: Option<BTreeMap<String, String>>,
}

impl FailureDetails {
    pub fn for_job(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            ..Default::default()
        }
    }

    /// Record which step is executing; called at the top of every step
    pub fn at_step(&mut self, step_number: usize, step_id: &str, function: &str) {
        self.step_number = Some(step_number);
        self.step_id = Some(step_id.to_string());
        self.function = Some(function.to_string());
    }

    /// Attach the backend response body, both raw and split into lines
    pub fn with_response(&mut self, response: impl Into<String>) {
        let response = response.into();
        let lines: BTreeMap<String, String> = response
            .trim()
            .split('\n')
            .filter(|row| !row.is_empty())
            .enumerate()
            .map(|(i, row)| (format!("l{}", i), row.to_string()))
            .collect();

        if !lines.is_empty() {
            self.response_lines = Some(lines);
        }
        self.response = Some(response);
    }

    fn summary(&self) -> &str {
        self.message.as_deref().unwrap_or("unknown error")
    }
}

/// Terminal outcome of a halted job
#[derive(Debug, Clone, PartialEq, Error)]
#[error("job {} halted: {}", .details.job_id, .details.summary())]
pub struct JobFailure {
    pub kind: FailureKind,
    pub details: FailureDetails,
}

impl JobFailure {
    fn new(
        kind: FailureKind,
        mut details: FailureDetails,
        message: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        details.message = Some(message.into());
        if description.is_some() {
            details.description = description;
        }
        Self { kind, details }
    }

    pub fn bad_request(
        details: FailureDetails,
        message: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self::new(FailureKind::BadRequest, details, message, description)
    }

    pub fn not_found(
        details: FailureDetails,
        message: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self::new(FailureKind::NotFound, details, message, description)
    }

    pub fn internal(
        details: FailureDetails,
        message: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self::new(FailureKind::Internal, details, message, description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_accumulate_position() {
        let mut details = FailureDetails::for_job("j1");
        details.at_step(2, "embed", "embedder/vectorize/");

        assert_eq!(details.step_number, Some(2));
        assert_eq!(details.step_id.as_deref(), Some("embed"));
        assert_eq!(details.function.as_deref(), Some("embedder/vectorize/"));
    }

    #[test]
    fn test_response_lines_split() {
        let mut details = FailureDetails::for_job("j1");
        details.with_response("first\nsecond\n\nthird\n");

        let lines = details.response_lines.unwrap();
        assert_eq!(lines["l0"], "first");
        assert_eq!(lines["l1"], "second");
        assert_eq!(lines["l2"], "third");
    }

    #[test]
    fn test_empty_response_has_no_lines() {
        let mut details = FailureDetails::for_job("j1");
        details.with_response("");
        assert!(details.response_lines.is_none());
        assert_eq!(details.response.as_deref(), Some(""));
    }

    #[test]
    fn test_serialization_omits_unset_fields() {
        let failure = JobFailure::bad_request(
            FailureDetails::for_job("j1"),
            "Invalid input JMESPath expression",
            Some("Syntax error".to_string()),
        );

        let json = serde_json::to_string(&failure.details).unwrap();
        assert!(json.contains("\"jobId\":\"j1\""));
        assert!(json.contains("\"message\":\"Invalid input JMESPath expression\""));
        assert!(!json.contains("stepNumber"));
        assert!(!json.contains("response"));
    }

    #[test]
    fn test_display() {
        let failure = JobFailure::not_found(
            FailureDetails::for_job("j9"),
            "Function not found",
            None,
        );
        assert_eq!(failure.to_string(), "job j9 halted: Function not found");
    }
}
