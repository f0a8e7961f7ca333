//! Domain layer - core entities and business rules

pub mod job;

pub use job::{
    FailureDetails, FailureKind, FunctionDescriptor, JobContext, JobFailure, Step, StepRecord,
    Workflow,
};
