//! Infrastructure layer - storage backends, workspace persistence,
//! JMESPath transforms, HTTP dispatch, logging

pub mod discovery;
pub mod dispatch;
pub mod logging;
pub mod storage;
pub mod transform;
pub mod workspace;

pub use dispatch::{DispatchError, FunctionDispatcher, HttpDispatcher};
pub use storage::{FileStore, InMemoryFileStore, LocalFileStore, StorageError};
pub use transform::TransformError;
pub use workspace::{Workspace, WorkspaceError};
