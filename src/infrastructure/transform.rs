//! JMESPath evaluation over JSON documents
//!
//! Thin wrapper over the `jmespath` crate. Expressions run against the full
//! serialized job context, so `start`, `state` and any step id are all
//! addressable. Missing keys resolve to null, never an error: the context is
//! a loosely-typed document and forward references to steps that have not run
//! yet are legal.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Invalid expression: {0}")]
    Compile(String),

    #[error("Expression evaluation failed: {0}")]
    Evaluate(String),

    #[error("Failed to convert result: {0}")]
    Convert(String),
}

/// Evaluate a JMESPath expression against a JSON document
pub fn apply(document: &Value, expression: &str) -> Result<Value, TransformError> {
    let compiled =
        jmespath::compile(expression).map_err(|e| TransformError::Compile(e.to_string()))?;

    let data = jmespath::Variable::from_json(&document.to_string())
        .map_err(TransformError::Evaluate)?;
    let result = compiled
        .search(data)
        .map_err(|e| TransformError::Evaluate(e.to_string()))?;

    serde_json::to_value(result.as_ref()).map_err(|e| TransformError::Convert(e.to_string()))
}
