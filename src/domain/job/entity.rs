//! Workflow and step wire types
//!
//! These match the submission JSON shape: the `_workflow` field of a job
//! request deserializes into [`Workflow`], with `xin`/`xout` holding the
//! optional JMESPath transform expressions.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// One unit of a workflow: an optional input transform, a function to call,
/// an optional output transform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Unique id for the step, allowing other steps to reference its content
    #[serde(default)]
    pub id: String,

    /// Function identifier: `tool/path` or one of `stop`/`exit`/`break`
    #[serde(default)]
    pub function: String,

    /// Optional JMESPath expression transforming the state before the call
    #[serde(default, rename = "xin")]
    pub input_transform: String,

    /// Optional JMESPath expression transforming the state after the call
    #[serde(default, rename = "xout")]
    pub output_transform: String,
}

/// Ordered list of steps plus the job identity. Immutable once execution
/// starts; ids are assigned at submission time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default, rename = "jobId")]
    pub job_id: String,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Workflow {
    /// Generate a job id if the submission did not carry one
    pub fn assign_job_id(&mut self) {
        if self.job_id.is_empty() {
            self.job_id = Uuid::new_v4().to_string();
        }
    }

    /// Assign a unique id to every step, rejecting duplicate explicit ids.
    ///
    /// Generated ids are deterministic: the function name, then
    /// `{function}1`, `{function}2`, ... on collision. This runs before
    /// execution starts so transform expressions can reference any step by id,
    /// including steps that have not run yet.
    pub fn assign_step_ids(&mut self) -> Result<(), String> {
        let mut used: HashSet<String> = HashSet::new();
        for step in &self.steps {
            if step.id.trim().is_empty() {
                continue;
            }
            if !used.insert(step.id.clone()) {
                return Err(format!("Duplicate step ID '{}' found", step.id));
            }
        }

        for step in &mut self.steps {
            if !step.id.is_empty() {
                continue;
            }

            let mut candidate = step.function.clone();
            let mut i = 1;
            while used.contains(&candidate) {
                candidate = format!("{}{}", step.function, i);
                i += 1;
            }

            step.id = candidate;
            used.insert(step.id.clone());
        }

        Ok(())
    }
}
