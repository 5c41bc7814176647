//! Shared fixtures for the end-to-end booking flow tests: canned site
//! pages and a scripted stand-in for the live HTTP session.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use yeyak::scan::{RowCheckbox, RowLink};
use yeyak::site::GymSite;
use yeyak::site::dialog::{Dialog, DialogQueue};
use yeyak::site::errors::SiteError;

/// Call log shared across the sessions one run creates.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

pub fn count_with_prefix(journal: &Journal, prefix: &str) -> usize {
    journal
        .lock()
        .unwrap()
        .iter()
        .filter(|entry| entry.starts_with(prefix))
        .count()
}

/// The pages a scripted session hands back, step by step.
#[derive(Debug, Clone, Default)]
pub struct SitePages {
    pub login: String,
    pub calendar: String,
    pub schedule: String,
    pub activation: String,
    pub confirm: Option<String>,
    pub history: String,
}

/// Scripted [`GymSite`] that records every call it receives.
pub struct FakeSite {
    pages: SitePages,
    login_error: Option<&'static str>,
    date_unavailable: bool,
    alerts_on_login: Vec<String>,
    alerts_on_activate: Vec<String>,
    pending: DialogQueue,
    journal: Journal,
}

impl FakeSite {
    pub fn new(pages: SitePages, journal: &Journal) -> Self {
        Self {
            pages,
            login_error: None,
            date_unavailable: false,
            alerts_on_login: Vec::new(),
            alerts_on_activate: Vec::new(),
            pending: DialogQueue::default(),
            journal: journal.clone(),
        }
    }

    /// A session whose login always fails with a transient page problem.
    pub fn failing_login(journal: &Journal) -> Self {
        let mut site = Self::new(SitePages::default(), journal);
        site.login_error = Some("login form");
        site
    }

    /// A session whose calendar rejects the target day as unselectable.
    pub fn closed_target_day(journal: &Journal) -> Self {
        let mut site = Self::new(SitePages::default(), journal);
        site.date_unavailable = true;
        site
    }

    /// Queues an alert the site raises on the post-login page.
    pub fn with_alert_on_login(mut self, text: impl Into<String>) -> Self {
        self.alerts_on_login.push(text.into());
        self
    }

    /// Queues an alert the site raises when the row action is activated.
    pub fn with_alert_on_activate(mut self, text: impl Into<String>) -> Self {
        self.alerts_on_activate.push(text.into());
        self
    }

    fn log(&self, call: String) {
        self.journal.lock().unwrap().push(call);
    }
}

#[async_trait]
impl GymSite for FakeSite {
    async fn login(&mut self, username: &str, _password: &str) -> Result<String, SiteError> {
        self.log(format!("login:{username}"));
        if let Some(missing) = self.login_error {
            return Err(SiteError::MissingElement(missing));
        }
        for alert in self.alerts_on_login.drain(..) {
            self.pending.push(alert);
        }
        Ok(self.pages.login.clone())
    }

    async fn calendar_page(&mut self) -> Result<String, SiteError> {
        self.log("calendar".into());
        Ok(self.pages.calendar.clone())
    }

    async fn select_date(&mut self, day: u32) -> Result<String, SiteError> {
        self.log(format!("select-date:{day}"));
        if self.date_unavailable {
            return Err(SiteError::DateUnavailable(day));
        }
        Ok(self.pages.schedule.clone())
    }

    async fn activate_link(&mut self, link: &RowLink) -> Result<String, SiteError> {
        self.log(format!("activate-link:{}", link.label));
        for alert in self.alerts_on_activate.drain(..) {
            self.pending.push(alert);
        }
        Ok(self.pages.activation.clone())
    }

    async fn activate_checkbox(&mut self, checkbox: &RowCheckbox) -> Result<String, SiteError> {
        self.log(format!("activate-checkbox:{}", checkbox.name));
        for alert in self.alerts_on_activate.drain(..) {
            self.pending.push(alert);
        }
        Ok(self.pages.activation.clone())
    }

    async fn submit_confirm(&mut self) -> Result<Option<String>, SiteError> {
        self.log("submit-confirm".into());
        Ok(self.pages.confirm.clone())
    }

    async fn history_page(&mut self) -> Result<String, SiteError> {
        self.log("history".into());
        Ok(self.pages.history.clone())
    }

    fn drain_dialogs(&mut self) -> Vec<Dialog> {
        self.pending.drain()
    }

    async fn snapshot(&mut self, step: &str) {
        self.log(format!("snapshot:{step}"));
    }
}

/// A timetable with the 10:30 target row plus a 09:30 neighbor, with the
/// given markup in the target row's action cell.
pub fn schedule_page(course: &str, action_cell: &str) -> String {
    format!(
        "<html><body><table>\
         <tr><td>09:30</td><td>매트 필라테스 (8/8)</td><td></td></tr>\
         <tr><td>10:30</td><td>{course}</td><td>{action_cell}</td></tr>\
         <tr><td>11:30</td><td>체어 필라테스 (2/8)</td><td></td></tr>\
         </table></body></html>"
    )
}

pub fn open_slot_schedule() -> String {
    schedule_page("바렐 체어 (3/8)", "<a href=\"res_step1.php?idx=7\">예약하기</a>")
}

pub fn waitlist_link_schedule() -> String {
    schedule_page("바렐 체어 (8/8)", "<a href=\"wait_step1.php?idx=7\">대기예약</a>")
}

pub fn waitlist_checkbox_schedule() -> String {
    schedule_page(
        "바렐 체어 (8/8)",
        "<input type=\"checkbox\" name=\"chk\" value=\"55\">",
    )
}

pub fn already_booked_schedule() -> String {
    schedule_page("바렐 체어 (4/8)", "<a href=\"res_del.php?idx=7\">삭제</a>")
}

pub fn closed_slot_schedule() -> String {
    schedule_page("바렐 체어 (3/8)", "예약불가")
}

pub fn neutral_page() -> String {
    "<html><body>처리중입니다.</body></html>".to_string()
}

pub fn success_page() -> String {
    "<html><body><p>예약완료 되었습니다.</p></body></html>".to_string()
}

pub fn waitlist_success_page() -> String {
    "<html><body><p>대기예약 완료 되었습니다.</p></body></html>".to_string()
}
