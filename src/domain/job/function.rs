//! Function identity resolution
//!
//! A step's `function` string is either empty, one of the reserved internal
//! keywords, or a `tool/sub/path` reference to an HTTP backend.

use serde::Serialize;

/// Resolved identity of what a step invokes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FunctionDescriptor {
    /// Empty function string: the step only runs its transforms
    None,

    /// Reserved keyword handled by the orchestrator itself
    Internal { name: String },

    /// HTTP function on a registered tool
    Http { tool: String, path: String },
}

impl FunctionDescriptor {
    /// Parse a step's function string.
    ///
    /// `stop`, `exit` and `break` (case-insensitive) all resolve to the
    /// internal `stop` function. Anything else splits on the first `/` into a
    /// tool name and a slash-wrapped sub-path.
    pub fn parse(function_id: &str) -> Self {
        let trimmed = function_id.trim();
        if trimmed.is_empty() {
            return Self::None;
        }

        match trimmed.to_lowercase().as_str() {
            "break" | "stop" | "exit" => {
                return Self::Internal {
                    name: "stop".to_string(),
                };
            }
            _ => {}
        }

        match trimmed.split_once('/') {
            Some((tool, rest)) => Self::Http {
                tool: tool.to_string(),
                path: format!("/{}/", rest.trim_matches('/')),
            },
            None => Self::Http {
                tool: trimmed.to_string(),
                path: "/".to_string(),
            },
        }
    }

    /// Human-readable label used in failure details, e.g. `chunker/chunk/`
    pub fn label(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Internal { name } => name.clone(),
            Self::Http { tool, path } => format!("{}{}", tool, path),
        }
    }
}
