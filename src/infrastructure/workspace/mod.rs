//! Per-job workspace persistence
//!
//! Every job owns a directory under the workspace root holding three
//! artifacts with fixed names, so external tools can inspect or recover any
//! in-flight or completed job:
//!
//! - `input.json`    - the original input snapshot
//! - `workflow.json` - the step list snapshot
//! - `context.json`  - the execution context, rewritten at every checkpoint

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::domain::{JobContext, Workflow};
use crate::infrastructure::storage::{FileStore, StorageError};
use crate::infrastructure::transform::{self, TransformError};

const INPUT_FILE: &str = "input.json";
const WORKFLOW_FILE: &str = "workflow.json";
const CONTEXT_FILE: &str = "context.json";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A persisted artifact exists but no longer parses
    #[error("Failed to deserialize context for job {job_id}: {message}")]
    CorruptContext { job_id: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable keyed storage of job artifacts over a pluggable [`FileStore`]
pub struct Workspace {
    store: Arc<dyn FileStore>,
    root: String,
    root_ready: OnceCell<()>,
}

impl Workspace {
    pub fn new(store: Arc<dyn FileStore>, root: impl Into<String>) -> Self {
        Self {
            store,
            root: root.into(),
            root_ready: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Create the job directory and write all three initial artifacts
    pub async fn create_workspace(
        &self,
        workflow: &Workflow,
        input: &Value,
    ) -> Result<(), WorkspaceError> {
        self.ensure_root_exists().await?;

        debug!("Creating workspace for job {}", workflow.job_id);
        let job_dir = self.job_dir(&workflow.job_id);
        self.store.create_dir(&job_dir).await?;

        let context = JobContext::new(input.clone());

        self.write_artifact(&workflow.job_id, WORKFLOW_FILE, workflow, true).await?;
        self.write_artifact(&workflow.job_id, INPUT_FILE, input, true).await?;
        self.write_artifact(&workflow.job_id, CONTEXT_FILE, &context, true).await?;
        Ok(())
    }

    /// Read back the current context checkpoint
    pub async fn get_context(&self, job_id: &str) -> Result<JobContext, WorkspaceError> {
        self.ensure_root_exists().await?;

        debug!("Fetching context from workspace for job {}", job_id);
        let path = self.artifact_path(job_id, CONTEXT_FILE);
        let content = self.store.read_all_text(&path).await?;

        serde_json::from_str(&content).map_err(|e| WorkspaceError::CorruptContext {
            job_id: job_id.to_string(),
            message: e.to_string(),
        })
    }

    /// Overwrite the context checkpoint; called after every phase
    pub async fn update_context(
        &self,
        job_id: &str,
        context: &JobContext,
    ) -> Result<(), WorkspaceError> {
        self.ensure_root_exists().await?;
        self.write_artifact(job_id, CONTEXT_FILE, context, false).await
    }

    /// Evaluate a JMESPath expression against the full serialized context.
    /// An empty expression returns the current state unchanged.
    pub fn transform_context(
        &self,
        context: &JobContext,
        expression: &str,
    ) -> Result<Value, TransformError> {
        if expression.trim().is_empty() {
            return Ok(context.state.clone());
        }

        debug!("Transforming context with JMESPath expression: {}", expression);
        let document = serde_json::to_value(context)
            .map_err(|e| TransformError::Convert(e.to_string()))?;
        transform::apply(&document, expression)
    }

    async fn write_artifact<T: serde::Serialize>(
        &self,
        job_id: &str,
        name: &str,
        artifact: &T,
        first_write: bool,
    ) -> Result<(), WorkspaceError> {
        let path = self.artifact_path(job_id, name);
        let content = serde_json::to_string_pretty(artifact)?;
        self.store.write_all_text(&path, &content, first_write).await?;
        Ok(())
    }

    async fn ensure_root_exists(&self) -> Result<(), WorkspaceError> {
        // One-time per-process check
        self.root_ready
            .get_or_try_init(|| async {
                debug!("Ensuring workspace root {} exists", self.root);
                self.store.create_dir_if_not_exists(&self.root).await
            })
            .await?;
        Ok(())
    }

    fn job_dir(&self, job_id: &str) -> String {
        self.store.combine_path(&self.root, job_id)
    }

    fn artifact_path(&self, job_id: &str, name: &str) -> String {
        let dir = self.job_dir(job_id);
        self.store.combine_path(&dir, name)
    }
}
