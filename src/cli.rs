//! Command line arguments.
//!
//! Almost everything is configured through the environment (see
//! [`crate::config`]); the flags here are run-shape overrides convenient
//! when invoking the binary by hand.

use clap::{Parser, ValueEnum};

/// Output format for stdout tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    /// Human-readable output for terminals.
    Pretty,
    /// Newline-delimited JSON for log collectors.
    Json,
}

#[derive(Debug, Parser)]
#[command(version, about = "Books the fixed-time pilates slot seven days ahead")]
pub struct Args {
    /// Tracing output format for stdout (the file log format is fixed)
    #[arg(long, value_enum, default_value = "pretty")]
    pub tracing: TracingFormat,

    /// Dry run: locate and classify the slot but never submit (same as TEST_MODE=true)
    #[arg(long)]
    pub test: bool,

    /// Skip the pre-run wait-until-open gate (same as SKIP_WAIT=true)
    #[arg(long)]
    pub skip_wait: bool,
}
