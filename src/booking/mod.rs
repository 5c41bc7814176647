//! The booking run itself.
//!
//! One run is a bounded retry loop over single attempts. Every attempt gets
//! a fresh site session and walks a fixed sequence: log in, open the
//! calendar, select the target day, locate the slot row, resolve what can
//! be done with it, act, then verify. Dialogs the session observed are
//! drained and classified at a checkpoint after each step; their content
//! decides retry-versus-fatal but never steers the flow anywhere else.

use std::sync::LazyLock;
use std::time::Duration;

use html_scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::report::{RunReport, RunStatus};
use crate::scan::action::{self, ActionOutcome, WaitlistVia};
use crate::scan::timeexpr::TimeMatcher;
use crate::scan::{RowCheckbox, RowLink, SlotLocator, collapsed_text};
use crate::schedule::TargetDate;
use crate::site::GymSite;
use crate::site::dialog::DialogKind;
use crate::site::errors::SiteError;
use crate::site::labels::{SUCCESS_PHRASES, WAITLIST_MARK};

/// Total attempts per run; the reservation window is contested for only a
/// few seconds, so there is no point in a longer tail.
pub const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);
/// A simultaneous-submission rejection means the server is mid-write;
/// give it a moment longer than an ordinary retry.
const CONFLICT_RETRY_DELAY: Duration = Duration::from_secs(3);

static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Why a single step could not finish its attempt.
#[derive(Debug)]
enum StepError {
    /// No retry can change the outcome.
    Fatal(String),
    /// Worth another attempt with a fresh session.
    Retry { conflict: bool, reason: String },
}

impl StepError {
    fn retry(reason: impl Into<String>) -> Self {
        Self::Retry { conflict: false, reason: reason.into() }
    }

    fn conflict(reason: impl Into<String>) -> Self {
        Self::Retry { conflict: true, reason: reason.into() }
    }
}

impl From<SiteError> for StepError {
    fn from(error: SiteError) -> Self {
        if error.is_fatal() {
            Self::Fatal(error.to_string())
        } else {
            Self::retry(error.to_string())
        }
    }
}

/// Terminal classification of one attempt.
#[derive(Debug)]
enum AttemptEnd {
    Booked { waiting: bool, verified: Option<bool>, message: String },
    DryRun { message: String },
    AlreadyBooked,
    Closed { detail: String },
}

enum ActivateVia {
    Link(RowLink),
    Checkbox(RowCheckbox),
}

/// Drives attempts until one finishes or the attempt budget runs out.
pub struct Orchestrator {
    config: Config,
    target: TargetDate,
    matcher: TimeMatcher,
}

impl Orchestrator {
    pub fn new(config: Config, target: TargetDate, matcher: TimeMatcher) -> Self {
        Self { config, target, matcher }
    }

    /// Runs the whole booking flow and reports however it ended. Sessions
    /// come from `make_session` so each attempt starts clean.
    pub async fn run<F>(&self, mut make_session: F) -> RunReport
    where
        F: FnMut() -> Result<Box<dyn GymSite>, SiteError>,
    {
        if self.target.is_weekend() {
            info!(target = %self.target, "target falls on a weekend, nothing to book");
            return RunReport::new(
                RunStatus::WeekendSkip,
                &self.target,
                self.matcher.label(),
                format!("no weekend classes ({}), booking skipped", self.target.day_label()),
                None,
            );
        }

        if self.config.test_mode {
            info!("dry run: the slot will be located and classified but never submitted");
        }

        let mut attempt = 1u32;
        loop {
            let end = match make_session() {
                Ok(mut site) => {
                    let end = self.attempt(site.as_mut(), attempt).await;
                    if end.is_err() {
                        site.snapshot("error-booking").await;
                    }
                    end
                }
                Err(error) => Err(StepError::retry(format!("session setup failed: {error}"))),
            };

            match end {
                Ok(done) => return self.conclude(done),
                Err(StepError::Fatal(reason)) => {
                    warn!(attempt, reason = %reason, "booking failed, not retrying");
                    return RunReport::new(
                        RunStatus::Failed,
                        &self.target,
                        self.matcher.label(),
                        reason,
                        None,
                    );
                }
                Err(StepError::Retry { conflict, reason }) => {
                    warn!(attempt, max_attempts = MAX_ATTEMPTS, reason = %reason, "booking attempt failed");
                    if attempt >= MAX_ATTEMPTS {
                        return RunReport::new(
                            RunStatus::Failed,
                            &self.target,
                            self.matcher.label(),
                            format!("all {MAX_ATTEMPTS} attempts failed; last error: {reason}"),
                            None,
                        );
                    }
                    let delay = if conflict { CONFLICT_RETRY_DELAY } else { RETRY_DELAY };
                    debug!(seconds = delay.as_secs(), "backing off before the next attempt");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, site: &mut dyn GymSite, attempt: u32) -> Result<AttemptEnd, StepError> {
        info!(
            attempt,
            max_attempts = MAX_ATTEMPTS,
            target = %self.target,
            class = self.matcher.label(),
            "starting booking attempt"
        );
        let mut saw_success_dialog = false;

        let (username, password) = self
            .config
            .credentials()
            .ok_or_else(|| StepError::Fatal("credentials are not configured".into()))?;
        site.login(username, password).await?;
        self.checkpoint(site, &mut saw_success_dialog)?;

        site.calendar_page().await?;
        self.checkpoint(site, &mut saw_success_dialog)?;

        let schedule = site.select_date(self.target.day).await?;
        self.checkpoint(site, &mut saw_success_dialog)?;
        site.snapshot("03-booking-page").await;
        site.snapshot("04-time-table").await;

        let row = {
            let doc = Html::parse_document(&schedule);
            SlotLocator::new(&self.matcher).locate(&doc)
        };
        if let Some(row) = &row {
            match &row.course {
                Some(course) => info!(course = %course, full = course.is_full(), "slot located"),
                None => info!(row = %row.summary(), "slot located without a course label"),
            }
        }

        let outcome = match &row {
            Some(row) => action::resolve(row),
            None => ActionOutcome::NotFound,
        };
        info!(action = outcome.label(), "slot action resolved");

        match outcome {
            ActionOutcome::NotFound => Err(StepError::retry(format!(
                "no {} class found in the schedule",
                self.matcher.label()
            ))),
            ActionOutcome::AlreadyBooked => Ok(AttemptEnd::AlreadyBooked),
            ActionOutcome::Closed(detail) => Ok(AttemptEnd::Closed { detail }),
            ActionOutcome::Reserve(link) => {
                self.perform(site, ActivateVia::Link(link), false, &mut saw_success_dialog)
                    .await
            }
            ActionOutcome::Waitlist { via, confirm_dialog } => {
                debug!(confirm_dialog, "taking the waitlist path");
                let via = match via {
                    WaitlistVia::Link(link) => ActivateVia::Link(link),
                    WaitlistVia::Checkbox(checkbox) => ActivateVia::Checkbox(checkbox),
                };
                self.perform(site, via, true, &mut saw_success_dialog).await
            }
        }
    }

    /// Activates the resolved control, confirms, and verifies. In dry runs
    /// this returns before anything is sent to the site.
    async fn perform(
        &self,
        site: &mut dyn GymSite,
        via: ActivateVia,
        waiting: bool,
        saw_success_dialog: &mut bool,
    ) -> Result<AttemptEnd, StepError> {
        if self.config.test_mode {
            let message = match &via {
                ActivateVia::Link(link) if waiting => {
                    format!("dry run: waitlist link '{}' available", link.label)
                }
                ActivateVia::Link(link) => {
                    format!("dry run: reserve link '{}' available", link.label)
                }
                ActivateVia::Checkbox(checkbox) => {
                    format!("dry run: waitlist checkbox '{}' available", checkbox.name)
                }
            };
            return Ok(AttemptEnd::DryRun { message });
        }

        let mut page = match &via {
            ActivateVia::Link(link) => site.activate_link(link).await?,
            ActivateVia::Checkbox(checkbox) => site.activate_checkbox(checkbox).await?,
        };
        self.checkpoint(site, saw_success_dialog)?;

        if let Some(confirmed) = site.submit_confirm().await? {
            page = confirmed;
            self.checkpoint(site, saw_success_dialog)?;
            site.snapshot("06-after-submit").await;
        }
        site.snapshot("07-booking-result").await;

        let verified = self.verify(site, &page, saw_success_dialog).await?;
        let mut message = if waiting {
            format!("{} class waitlisted", self.matcher.label())
        } else {
            format!("{} class reserved", self.matcher.label())
        };
        if verified == Some(false) {
            message.push_str(" (verification inconclusive)");
        }
        Ok(AttemptEnd::Booked { waiting, verified, message })
    }

    /// Confirms the reservation actually landed. Steps are ordered from
    /// cheapest to broadest; any one positive answer ends the chain. When
    /// none answers, the submission is still treated as a success with
    /// `verified` set to `false`, because unwinding an order that may have
    /// gone through is worse than over-reporting doubt.
    async fn verify(
        &self,
        site: &mut dyn GymSite,
        page: &str,
        saw_success_dialog: &mut bool,
    ) -> Result<Option<bool>, StepError> {
        if SUCCESS_PHRASES.iter().any(|phrase| page.contains(phrase)) {
            info!("result page carries a success phrase");
            site.snapshot("08-booking-success-message").await;
            return Ok(Some(true));
        }

        // Cross-checks are best-effort: a network failure here must not
        // discard a submission that already happened server-side.
        match site.history_page().await {
            Ok(history) => {
                self.checkpoint(site, saw_success_dialog)?;
                site.snapshot("08-booking-list-page").await;
                if self.history_confirms(&history) {
                    return Ok(Some(true));
                }
            }
            Err(error) => warn!(error = %error, "reservation history unavailable"),
        }

        match site.calendar_page().await {
            Ok(calendar) => {
                self.checkpoint(site, saw_success_dialog)?;
                let marked = {
                    let doc = Html::parse_document(&calendar);
                    calendar_shows_mark(&doc, self.target.day)
                };
                if marked {
                    info!(day = self.target.day, "calendar shows the reservation mark");
                    site.snapshot("08-calendar-verified").await;
                    return Ok(Some(true));
                }
            }
            Err(error) => warn!(error = %error, "calendar check unavailable"),
        }

        if *saw_success_dialog {
            info!("confirmation dialog already reported success");
            return Ok(Some(true));
        }

        info!("verification inconclusive, keeping the submission as a soft success");
        Ok(Some(false))
    }

    /// Scans the reservation history page for the booked class. The time
    /// has to appear; a matching date or a waitlist mark only sharpens the
    /// log line.
    fn history_confirms(&self, body: &str) -> bool {
        if !self.matcher.appears_in(body) {
            return false;
        }
        let dated = self.date_variants().iter().any(|form| body.contains(form));
        let waitlisted = body.contains(WAITLIST_MARK);
        info!(dated, waitlisted, "history lists the class time");
        true
    }

    /// Date spellings the history page has been seen to use.
    fn date_variants(&self) -> [String; 7] {
        let TargetDate { year, month, day, .. } = self.target;
        [
            self.target.korean_label(),
            format!("{month}/{day}"),
            format!("{month}-{day}"),
            format!("{month}.{day}"),
            format!("{year}-{month}-{day}"),
            format!("{year}.{month}.{day}"),
            format!("{year}/{month}/{day}"),
        ]
    }

    /// Classifies everything the site said since the previous checkpoint.
    /// Later dialogs never override an earlier failure kind.
    fn checkpoint(
        &self,
        site: &mut dyn GymSite,
        saw_success_dialog: &mut bool,
    ) -> Result<(), StepError> {
        for dialog in site.drain_dialogs() {
            info!(kind = ?dialog.kind, text = %dialog.text, "site dialog");
            match dialog.kind {
                DialogKind::AuthRejected => {
                    return Err(StepError::Fatal(format!("login rejected: {}", dialog.text)));
                }
                DialogKind::ConflictRetry => {
                    return Err(StepError::conflict(format!(
                        "simultaneous submission conflict: {}",
                        dialog.text
                    )));
                }
                DialogKind::SessionTimeout => {
                    return Err(StepError::retry(format!("site session timed out: {}", dialog.text)));
                }
                DialogKind::Success => *saw_success_dialog = true,
                DialogKind::Other => {}
            }
        }
        Ok(())
    }

    fn conclude(&self, end: AttemptEnd) -> RunReport {
        let label = self.matcher.label();
        match end {
            AttemptEnd::Booked { waiting, verified, message } => {
                let status = if waiting { RunStatus::Waiting } else { RunStatus::Success };
                info!(status = ?status, verified = ?verified, "booking flow completed");
                RunReport::new(status, &self.target, label, message, verified)
            }
            AttemptEnd::DryRun { message } => {
                info!(message = %message, "dry run complete");
                RunReport::new(RunStatus::Test, &self.target, label, message, None)
            }
            AttemptEnd::AlreadyBooked => {
                info!("this account already holds the slot");
                RunReport::new(
                    RunStatus::AlreadyBooked,
                    &self.target,
                    label,
                    format!("{label} class is already booked"),
                    Some(true),
                )
            }
            AttemptEnd::Closed { detail } => {
                warn!(detail = %detail, "slot offers no action");
                RunReport::new(
                    RunStatus::Failed,
                    &self.target,
                    label,
                    format!("booking closed for the {label} class: {detail}"),
                    None,
                )
            }
        }
    }
}

/// True when any calendar cell mentions both the day number and the
/// reservation mark the site appends to booked days.
fn calendar_shows_mark(doc: &Html, day: u32) -> bool {
    let day_str = day.to_string();
    doc.select(&TD).any(|cell| {
        let text = collapsed_text(cell);
        text.contains(&day_str) && text.contains(WAITLIST_MARK)
    })
}
