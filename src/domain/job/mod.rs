//! Job domain: workflow definition, execution context and failure types

pub mod context;
pub mod entity;
pub mod failure;
pub mod function;

pub use context::{JobContext, StepRecord};
pub use entity::{Step, Workflow};
pub use failure::{FailureDetails, FailureKind, JobFailure};
pub use function::FunctionDescriptor;
