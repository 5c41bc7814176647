//! Environment-derived configuration.
//!
//! All settings come from the process environment (a local `.env` file is
//! loaded by `dotenvy` before extraction). Only the two credential variables
//! are required; everything else has a default suitable for the real site.

use custom_debug_derive::Debug as CustomDebug;
use figment::Figment;
use figment::providers::Env;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Site origin used when `BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://ad2.mbgym.kr";

/// Base request timeout for one page navigation.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, CustomDebug, Deserialize)]
pub struct Config {
    /// Member name used on the login form (`PILATES_USERNAME`).
    #[serde(default)]
    pub pilates_username: Option<String>,
    /// Member number used on the login form (`PILATES_PASSWORD`).
    #[serde(default)]
    #[debug(with = "crate::fmt::redacted_opt")]
    pub pilates_password: Option<String>,

    /// Dry run: locate and classify the slot but never submit.
    #[serde(default)]
    pub test_mode: bool,
    /// Skip the pre-run wait-until-open gate.
    #[serde(default)]
    pub skip_wait: bool,

    /// Accepted for workflow compatibility; the HTTP session has no window,
    /// so this is inert (logged once at startup).
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Set by GitHub Actions runners.
    #[serde(default)]
    pub github_actions: bool,
    /// Generic CI marker.
    #[serde(default)]
    pub ci: bool,

    /// Site origin; overridable so integration tests can target a fixture server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Clock label of the class to book, e.g. `10:30`.
    #[serde(default = "default_target_time")]
    pub target_time: String,
    /// KST wall-clock time the reservation window opens, e.g. `12:00`.
    #[serde(default = "default_open_time")]
    pub open_time: String,

    /// Base tracing level for this crate (`RUST_LOG` still wins).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory the result file, `logs/` and `screenshots/` are written under.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_target_time() -> String {
    "10:30".to_string()
}

fn default_open_time() -> String {
    "12:00".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_workdir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Extracts the configuration from the process environment. Every field
    /// has a default, so this only fails on malformed values.
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::new().merge(Env::raw()).extract()
    }

    /// Both credentials, or `None` if either is missing or blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let user = self.pilates_username.as_deref().filter(|s| !s.is_empty())?;
        let pass = self.pilates_password.as_deref().filter(|s| !s.is_empty())?;
        Some((user, pass))
    }

    /// True when running inside a constrained CI sandbox.
    pub fn constrained_ci(&self) -> bool {
        self.github_actions || self.ci
    }

    /// Per-request timeout; doubled on CI runners, which are slow under load.
    pub fn request_timeout(&self) -> Duration {
        if self.constrained_ci() {
            REQUEST_TIMEOUT * 2
        } else {
            REQUEST_TIMEOUT
        }
    }

    /// Path of the single JSON result artifact for this run.
    pub fn result_path(&self) -> PathBuf {
        let name = if self.test_mode {
            "test-result.json"
        } else {
            "booking-result.json"
        };
        self.workdir.join(name)
    }

    /// Path of the append-only run log.
    pub fn log_path(&self) -> PathBuf {
        let name = if self.test_mode {
            "test.log"
        } else {
            "booking.log"
        };
        self.workdir.join("logs").join(name)
    }

    /// Directory page snapshots are dumped into.
    pub fn snapshot_dir(&self) -> PathBuf {
        self.workdir.join("screenshots")
    }

    /// Snapshot filename prefix distinguishing dry runs.
    pub fn snapshot_prefix(&self) -> &'static str {
        if self.test_mode { "test-" } else { "" }
    }
}
