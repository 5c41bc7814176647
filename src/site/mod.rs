//! HTTP session against the booking site.
//!
//! The site is classic server-rendered PHP: every interaction is a GET or
//! a form POST, state lives in a session cookie, and feedback arrives as
//! inline `alert(...)` scripts. One [`GymSession`] stands in for what a
//! member's browser would do across a single run attempt.

pub mod dialog;
pub mod dispatch;
pub mod errors;
pub mod forms;
pub mod labels;

use async_trait::async_trait;
use html_scraper::{Html, Selector};
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::scan::{RowCheckbox, RowLink, collapsed_text};
use dialog::{Dialog, DialogQueue};
use dispatch::Navigation;
use errors::SiteError;
use forms::{FormMethod, SubmitPlan};
use labels::{
    ACCEPT_LANGUAGE, BOOKING_FORM_MARKER, CALENDAR_PATH, HISTORY_PATH, LOGGED_IN_SELECTOR,
    UNAVAILABLE_MARK, USER_AGENT,
};

static LOGGED_IN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(LOGGED_IN_SELECTOR).unwrap());
static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// One pass over the booking site within a single attempt.
///
/// The production implementation speaks HTTP; tests substitute a scripted
/// double. Methods hand back raw page HTML so document parsing stays
/// outside every `await` boundary.
#[async_trait]
pub trait GymSite: Send {
    /// Authenticates, or detects an existing session, and returns the page
    /// reached afterwards.
    async fn login(&mut self, username: &str, password: &str) -> Result<String, SiteError>;
    /// Opens the calendar view.
    async fn calendar_page(&mut self) -> Result<String, SiteError>;
    /// Selects the target day on the current calendar page and returns
    /// that day's schedule.
    async fn select_date(&mut self, day: u32) -> Result<String, SiteError>;
    /// Activates a row link (reserve or waitlist).
    async fn activate_link(&mut self, link: &RowLink) -> Result<String, SiteError>;
    /// Ticks a waitlist checkbox and submits its form.
    async fn activate_checkbox(&mut self, checkbox: &RowCheckbox) -> Result<String, SiteError>;
    /// Presses the confirm control if the current page offers one.
    async fn submit_confirm(&mut self) -> Result<Option<String>, SiteError>;
    /// Opens the reservation history view.
    async fn history_page(&mut self) -> Result<String, SiteError>;
    /// Takes every dialog observed since the last drain, oldest first.
    fn drain_dialogs(&mut self) -> Vec<Dialog>;
    /// Saves the current page for diagnosis. Best-effort, never fails.
    async fn snapshot(&mut self, step: &str);
}

/// Page-source dumps standing in for screenshots.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    prefix: String,
}

impl SnapshotWriter {
    pub fn new(config: &Config) -> Self {
        Self {
            dir: config.snapshot_dir(),
            prefix: config.snapshot_prefix().to_string(),
        }
    }

    pub async fn capture(&self, step: &str, html: &str) {
        let millis = chrono::Utc::now().timestamp_millis();
        let path = self.dir.join(format!("{}{step}-{millis}.html", self.prefix));
        match self.write(&path, html).await {
            Ok(()) => debug!(step, path = %path.display(), "saved page snapshot"),
            Err(error) => warn!(step, error = %error, "failed to save page snapshot"),
        }
    }

    async fn write(&self, path: &Path, html: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(path, html).await
    }
}

/// Live HTTP implementation of [`GymSite`].
pub struct GymSession {
    client: reqwest::Client,
    base: Url,
    current_url: Url,
    current_html: String,
    dialogs: DialogQueue,
    snapshots: SnapshotWriter,
}

impl GymSession {
    pub fn new(config: &Config) -> Result<Self, SiteError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE));

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        let base = Url::parse(&config.base_url)?;
        Ok(Self {
            client,
            current_url: base.clone(),
            base,
            current_html: String::new(),
            dialogs: DialogQueue::default(),
            snapshots: SnapshotWriter::new(config),
        })
    }

    async fn get(&mut self, url: Url) -> Result<String, SiteError> {
        let request = self.client.get(url);
        self.exchange(request).await
    }

    /// Sends one request, capturing redirects, inline alerts and the page
    /// itself as the new session position.
    async fn exchange(&mut self, request: reqwest::RequestBuilder) -> Result<String, SiteError> {
        let response = request.send().await?;
        let final_url = response.url().clone();
        let status = response.status();
        let html = response.text().await?;
        debug!(url = %final_url, status = %status, bytes = html.len(), "page fetched");

        if !status.is_success() {
            return Err(SiteError::UnexpectedPage {
                url: final_url.to_string(),
                detail: format!("HTTP {status}"),
            });
        }

        for alert in dialog::extract_alerts(&html) {
            self.dialogs.push(alert);
        }
        self.current_url = final_url;
        self.current_html = html.clone();
        Ok(html)
    }

    fn resolve(&self, target: &str) -> Result<Url, SiteError> {
        Ok(self.current_url.join(target)?)
    }

    async fn execute_plan(&mut self, plan: SubmitPlan) -> Result<String, SiteError> {
        let target = match &plan.action {
            Some(action) => self.resolve(action)?,
            None => self.current_url.clone(),
        };
        if let Some(control) = &plan.control {
            debug!(control = %control, url = %target, "submitting form");
        }
        let request = match plan.method {
            FormMethod::Post => self.client.post(target).form(&plan.params),
            FormMethod::Get => self.client.get(target).query(&plan.params),
        };
        self.exchange(request).await
    }

    async fn navigate(&mut self, nav: Navigation) -> Result<String, SiteError> {
        match nav {
            Navigation::Get(target) => {
                let url = self.resolve(&target)?;
                self.get(url).await
            }
            Navigation::FieldSubmit { form, sets } => {
                let plan = {
                    let doc = Html::parse_document(&self.current_html);
                    forms::scripted_plan(&doc, form.as_deref(), &sets)
                }?;
                self.execute_plan(plan).await
            }
        }
    }
}

#[async_trait]
impl GymSite for GymSession {
    async fn login(&mut self, username: &str, password: &str) -> Result<String, SiteError> {
        let url = self.base.join(CALENDAR_PATH)?;
        let html = self.get(url).await?;
        self.snapshot("01-login-page").await;

        let already = {
            let doc = Html::parse_document(&html);
            doc.select(&LOGGED_IN).next().is_some()
        };
        if already {
            info!("existing session detected, skipping the login form");
            return Ok(html);
        }

        let plan = {
            let doc = Html::parse_document(&html);
            forms::login_plan(&doc, username, password)
        }?;
        let html = self.execute_plan(plan).await?;
        self.snapshot("02-after-login").await;

        let marker = {
            let doc = Html::parse_document(&html);
            doc.select(&LOGGED_IN).next().is_some()
        };
        if self.current_url.as_str().contains(BOOKING_FORM_MARKER) {
            info!("login reached the booking form");
        } else if marker {
            info!("login confirmed by session marker");
        } else {
            // Some responses carry no marker at all; the next step fails
            // loudly if the session is actually unauthenticated.
            debug!(url = %self.current_url, "no explicit login marker, continuing");
        }
        Ok(html)
    }

    async fn calendar_page(&mut self) -> Result<String, SiteError> {
        let url = self.base.join(CALENDAR_PATH)?;
        self.get(url).await
    }

    async fn select_date(&mut self, day: u32) -> Result<String, SiteError> {
        let decision = {
            let doc = Html::parse_document(&self.current_html);
            pick_day_cell(&doc, day, &self.current_html)
        };
        match decision {
            DaySelection::Navigate(nav) => {
                info!(day, "selecting calendar day");
                self.navigate(nav).await
            }
            DaySelection::InPlace => {
                debug!(day, "day cell carries no link, using the current page");
                Ok(self.current_html.clone())
            }
            DaySelection::Unavailable => Err(SiteError::DateUnavailable(day)),
            DaySelection::Missing => {
                Err(SiteError::MissingElement("calendar cell for the target day"))
            }
        }
    }

    async fn activate_link(&mut self, link: &RowLink) -> Result<String, SiteError> {
        let nav =
            dispatch::resolve_click(link.href.as_deref(), link.onclick.as_deref(), &self.current_html)
                .ok_or(SiteError::MissingElement("usable action link in the row"))?;
        info!(label = %link.label, "activating row action");
        self.navigate(nav).await
    }

    async fn activate_checkbox(&mut self, checkbox: &RowCheckbox) -> Result<String, SiteError> {
        let plan = {
            let doc = Html::parse_document(&self.current_html);
            forms::checkbox_plan(&doc, &checkbox.name, &checkbox.value)
        }?;
        info!(checkbox = %checkbox.name, "submitting waitlist checkbox");
        self.execute_plan(plan).await
    }

    async fn submit_confirm(&mut self) -> Result<Option<String>, SiteError> {
        let plan = {
            let doc = Html::parse_document(&self.current_html);
            forms::submit_plan(&doc)
        };
        let Some(plan) = plan else {
            debug!("no confirm control on the current page");
            return Ok(None);
        };
        self.execute_plan(plan).await.map(Some)
    }

    async fn history_page(&mut self) -> Result<String, SiteError> {
        let url = self.base.join(HISTORY_PATH)?;
        self.get(url).await
    }

    fn drain_dialogs(&mut self) -> Vec<Dialog> {
        self.dialogs.drain()
    }

    async fn snapshot(&mut self, step: &str) {
        self.snapshots.capture(step, &self.current_html).await;
    }
}

#[derive(Debug, PartialEq, Eq)]
enum DaySelection {
    Navigate(Navigation),
    InPlace,
    Unavailable,
    Missing,
}

/// Finds the target day's calendar cell and decides how to act on it.
///
/// A cell marked `X` (or whose link resolves to nothing) counts as closed
/// for the day; a missing cell is just an incompletely rendered page.
fn pick_day_cell(doc: &Html, day: u32, page: &str) -> DaySelection {
    let day_str = day.to_string();
    let mut saw_closed = false;

    for cell in doc.select(&TD) {
        let text = collapsed_text(cell);
        if !is_day_cell(&text, &day_str) {
            continue;
        }
        if text.contains(UNAVAILABLE_MARK) {
            saw_closed = true;
            continue;
        }
        if let Some(link) = cell.select(&ANCHOR).next() {
            match dispatch::resolve_click(link.attr("href"), link.attr("onclick"), page) {
                Some(nav) => return DaySelection::Navigate(nav),
                None => {
                    saw_closed = true;
                    continue;
                }
            }
        }
        return DaySelection::InPlace;
    }

    if saw_closed { DaySelection::Unavailable } else { DaySelection::Missing }
}

/// Cell text starts with the day number at a digit boundary, so day `1`
/// never matches the `15` cell; trailing markers (`*`, weekday names) are
/// fine.
fn is_day_cell(text: &str, day: &str) -> bool {
    match text.strip_prefix(day) {
        Some(rest) => !rest.starts_with(|c: char| c.is_ascii_digit()),
        None => false,
    }
}
