//! Jobflow orchestrator
//!
//! A synchronous workflow orchestration service: clients submit a declarative
//! step list plus an input document, the orchestrator runs the steps in order
//! against HTTP function tools, reshaping state between steps with JMESPath
//! expressions and checkpointing progress to a durable workspace after every
//! phase.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod orchestration;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use config::WorkspaceBackend;
use infrastructure::discovery;
use infrastructure::dispatch::HttpDispatcher;
use infrastructure::logging::redact_path;
use infrastructure::storage::{FileStore, InMemoryFileStore, LocalFileStore};
use infrastructure::workspace::Workspace;
use orchestration::Orchestrator;

/// Wire up the application state from configuration
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let tools = discovery::discover_tools(&config.tools);
    for (name, url) in &tools {
        info!("Tool '{}' at {}", name, url);
    }

    let workspace_dir = config.workspace.resolve_dir();

    let store: Arc<dyn FileStore> = match config.workspace.backend {
        WorkspaceBackend::Local => {
            info!("Workspace on disk: {}", redact_path(&workspace_dir));
            Arc::new(LocalFileStore::new())
        }
        WorkspaceBackend::Memory => {
            info!("Workspace in memory, lease_writes: {}", config.workspace.lease_writes);
            if config.workspace.lease_writes {
                Arc::new(InMemoryFileStore::with_leases())
            } else {
                Arc::new(InMemoryFileStore::new())
            }
        }
    };

    let workspace = Arc::new(Workspace::new(store, workspace_dir.clone()));
    let dispatcher = Arc::new(HttpDispatcher::new(tools.clone()));
    let orchestrator = Arc::new(Orchestrator::new(workspace, dispatcher));

    Ok(AppState::new(orchestrator, tools, workspace_dir))
}
