//! Error types for the gym site session.

/// Failures surfaced by one site interaction.
///
/// Only [`AuthRejected`](SiteError::AuthRejected) and
/// [`DateUnavailable`](SiteError::DateUnavailable) are final for a run;
/// everything else is worth another attempt with a fresh session.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("expected element not found: {0}")]
    MissingElement(&'static str),
    #[error("unexpected page at {url}: {detail}")]
    UnexpectedPage { url: String, detail: String },
    #[error("credentials are not registered with the site")]
    AuthRejected,
    #[error("calendar day {0} is closed or not selectable")]
    DateUnavailable(u32),
}

impl SiteError {
    /// True when retrying with a fresh session cannot change the outcome.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthRejected | Self::DateUnavailable(_))
    }
}
