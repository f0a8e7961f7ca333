//! Function dispatch: resolving a step's function to an HTTP backend
//!
//! Tools are registered once at construction as a name -> base URL map; the
//! dispatcher POSTs the job's current state to the function path and maps the
//! HTTP outcome into orchestrator error categories. Error bodies are scrubbed
//! of home-directory paths before leaving the service.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::FunctionDescriptor;
use crate::infrastructure::logging::redact_message;

/// Outcome categories for a failed dispatch, carrying the backend response
/// body for diagnostics
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registered tool matches the function's tool name
    #[error("Function {function} not found, HTTP client not available")]
    ToolNotAvailable { function: String },

    /// Backend answered 404
    #[error("Function not found")]
    FunctionNotFound { description: String, response: String },

    /// Backend answered 400
    #[error("Invalid call to function")]
    InvalidCall { description: String, response: String },

    /// Backend answered any other non-2xx status
    #[error("Function error")]
    Backend { description: String, response: String },

    /// Transport failure or unparseable success body
    #[error("Function request failed: {0}")]
    Request(String),
}

/// Invokes the backend identified by a function descriptor with the current
/// state as the request body, returning the new state.
#[async_trait]
pub trait FunctionDispatcher: Send + Sync {
    async fn execute(
        &self,
        descriptor: &FunctionDescriptor,
        state: &Value,
    ) -> Result<Value, DispatchError>;
}

/// HTTP-based dispatcher over a fixed tool registry
pub struct HttpDispatcher {
    client: reqwest::Client,
    tools: HashMap<String, String>,
}

impl HttpDispatcher {
    pub fn new(tools: HashMap<String, String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            tools,
        }
    }

    pub fn with_timeout(tools: HashMap<String, String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            tools,
        }
    }

    fn base_url(&self, tool: &str) -> Option<&str> {
        self.tools.get(tool).map(String::as_str).filter(|url| !url.is_empty())
    }
}

#[async_trait]
impl FunctionDispatcher for HttpDispatcher {
    async fn execute(
        &self,
        descriptor: &FunctionDescriptor,
        state: &Value,
    ) -> Result<Value, DispatchError> {
        let FunctionDescriptor::Http { tool, path } = descriptor else {
            return Err(DispatchError::Request(format!(
                "not an HTTP function: {}",
                descriptor.label()
            )));
        };

        let Some(base) = self.base_url(tool) else {
            return Err(DispatchError::ToolNotAvailable {
                function: descriptor.label(),
            });
        };

        let url = format!("{}{}", base.trim_end_matches('/'), path);
        debug!("Invoking function '{}': POST {}", descriptor.label(), url);

        let response = self
            .client
            .post(&url)
            .json(state)
            .send()
            .await
            .map_err(|e| DispatchError::Request(redact_message(&e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let description = format!("Call to '{}' returned {}", url, status);
            let body = redact_message(&response.text().await.unwrap_or_default());

            return Err(match status {
                StatusCode::NOT_FOUND => DispatchError::FunctionNotFound {
                    description,
                    response: body,
                },
                StatusCode::BAD_REQUEST => DispatchError::InvalidCall {
                    description,
                    response: body,
                },
                _ => DispatchError::Backend {
                    description,
                    response: body,
                },
            });
        }

        response
            .json()
            .await
            .map_err(|e| DispatchError::Request(redact_message(&e.to_string())))
    }
}
