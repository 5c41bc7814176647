//! Run assembly: arm the opening gate, resolve the target, book, and
//! persist the result artifact.

use anyhow::Context;
use std::process::ExitCode;
use tracing::{debug, error, info};

use crate::booking::Orchestrator;
use crate::config::Config;
use crate::report::RunReport;
use crate::scan::timeexpr::TimeMatcher;
use crate::schedule::{self, TargetDate};
use crate::site::{GymSession, GymSite};

/// Executes one booking run end to end and maps it to a process exit code.
/// `FAILURE` means either a `FAILED` run result or an abort before a result
/// could be produced.
pub async fn run(config: Config) -> ExitCode {
    match execute(config).await {
        Ok(report) => {
            info!(status = ?report.status, message = %report.message, "run finished");
            if report.status.exit_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            error!(error = format!("{error:#}"), "run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn execute(config: Config) -> anyhow::Result<RunReport> {
    let matcher = TimeMatcher::new(&config.target_time).with_context(|| {
        format!("TARGET_TIME {:?} is not a valid H:MM clock time", config.target_time)
    })?;

    // The reservation window opens at a fixed wall-clock time; the workflow
    // starts this process a little early and the gate holds it until then.
    if config.skip_wait {
        debug!("wait gate skipped");
    } else {
        let open = schedule::parse_clock(&config.open_time).with_context(|| {
            format!("OPEN_TIME {:?} is not a valid H:MM clock time", config.open_time)
        })?;
        schedule::wait_until_open(open).await;
    }

    // Resolved after the gate so a wait across midnight still lands on the
    // calendar day the freshly opened window is selling.
    let target = TargetDate::from_current_time();
    info!(target = %target, class = matcher.label(), "booking target resolved");

    let session_config = config.clone();
    let orchestrator = Orchestrator::new(config.clone(), target, matcher);
    let report = orchestrator
        .run(move || {
            GymSession::new(&session_config).map(|session| Box::new(session) as Box<dyn GymSite>)
        })
        .await;

    let path = config.result_path();
    report
        .write(&path)
        .with_context(|| format!("failed to write the run result to {}", path.display()))?;
    info!(path = %path.display(), "run result recorded");

    Ok(report)
}
