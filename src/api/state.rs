//! Application state for shared services

use std::collections::HashMap;
use std::sync::Arc;

use crate::orchestration::Orchestrator;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Tool name -> base URL, fixed at startup
    pub tools: Arc<HashMap<String, String>>,
    pub workspace_dir: String,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        tools: HashMap<String, String>,
        workspace_dir: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            tools: Arc::new(tools),
            workspace_dir: workspace_dir.into(),
        }
    }
}
