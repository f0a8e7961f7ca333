//! Job context: the full mutable state of an in-flight job
//!
//! Serializes flat, so transform expressions can address any part of it:
//!
//! ```json
//! { "start": {...}, "state": {...}, "<stepId>": {"in": {...}, "out": {...}} }
//! ```
//!
//! `start` holds the original input and never changes; `state` is the current
//! working value, replaced once per phase. Each step gets a record with the
//! state at entry (`in`) and at exit (`out`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Per-step provenance record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    #[serde(rename = "in")]
    pub input: Value,

    #[serde(rename = "out", skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

/// Full execution context of one job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobContext {
    pub start: Value,

    pub state: Value,

    /// Step-id keyed records; flattened so step ids live next to the
    /// reserved `start`/`state` keys in the serialized document
    #[serde(flatten)]
    pub steps: BTreeMap<String, StepRecord>,
}

impl JobContext {
    /// Create the initial context: both `start` and `state` hold the input
    pub fn new(input: Value) -> Self {
        Self {
            start: input.clone(),
            state: input,
            steps: BTreeMap::new(),
        }
    }

    /// Open the record for a step, capturing the state at entry
    pub fn begin_step(&mut self, step_id: &str) {
        self.steps.insert(
            step_id.to_string(),
            StepRecord {
                input: self.state.clone(),
                output: None,
            },
        );
    }

    /// Close the record for a step, capturing the state at exit
    pub fn end_step(&mut self, step_id: &str) {
        if let Some(record) = self.steps.get_mut(step_id) {
            record.output = Some(self.state.clone());
        }
    }
}
