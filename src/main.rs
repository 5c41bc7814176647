use clap::Parser;
use std::process::ExitCode;
use tracing::{info, warn};
use yeyak::cli::Args;
use yeyak::config::Config;
use yeyak::logging::setup_logging;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration error: {error}");
            return ExitCode::FAILURE;
        }
    };
    config.test_mode |= args.test;
    config.skip_wait |= args.skip_wait;

    // Checked before logging setup so the message lands on a bare stderr
    // instead of inside a log stream nobody reads interactively.
    if config.credentials().is_none() {
        eprintln!("error: login credentials are not set");
        eprintln!();
        eprintln!("Provide both variables in the environment or in a .env file:");
        eprintln!("  PILATES_USERNAME   member name used on the login form");
        eprintln!("  PILATES_PASSWORD   member number used on the login form");
        return ExitCode::FAILURE;
    }

    let file_log_attached = setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        test_mode = config.test_mode,
        skip_wait = config.skip_wait,
        "starting yeyak"
    );
    if !file_log_attached {
        warn!("run log file could not be opened, continuing with stdout only");
    }
    if !config.headless {
        // Kept for workflow compatibility with the browser-driven era.
        info!("HEADLESS=false has no effect, the session is plain HTTP");
    }

    yeyak::app::run(config).await
}
