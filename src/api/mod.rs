//! HTTP API layer

pub mod health;
pub mod jobs;
pub mod parser;
pub mod router;
pub mod state;
pub mod status;
pub mod types;
