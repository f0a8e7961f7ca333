//! CLI module for the jobflow orchestrator

pub mod serve;

use clap::{Parser, Subcommand};

/// Jobflow - synchronous workflow orchestration over HTTP function tools
#[derive(Parser)]
#[command(name = "jobflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the orchestrator HTTP service
    Serve,
}
