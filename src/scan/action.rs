//! Row action resolution.
//!
//! Given the located timetable row, decide what the site is offering for
//! it. Labels are checked in a fixed priority ladder so a row carrying
//! several controls resolves the same way every run.

use crate::site::labels::{CANCEL_LABELS, RESERVE_LABEL, WAITLIST_LABELS};

use super::capacity::CourseInfo;
use super::{RowCheckbox, RowLink, TimeTableRow};

/// How a waitlist entry gets submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitlistVia {
    /// A labeled link; activating it may auto-submit through an inline
    /// handler, and the site answers with a confirmation dialog.
    Link(RowLink),
    /// No link at all on a full class; tick the row checkbox and submit
    /// the surrounding form explicitly.
    Checkbox(RowCheckbox),
}

/// What can be done with the target slot right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Open seats; activate this link to start the reservation.
    Reserve(RowLink),
    Waitlist { via: WaitlistVia, confirm_dialog: bool },
    /// A cancel/delete control means this member already holds the slot.
    AlreadyBooked,
    /// Row exists but offers nothing actionable; carries the row text.
    Closed(String),
    /// No row matched the target time at all.
    NotFound,
}

impl ActionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reserve(_) => "reserve",
            Self::Waitlist { .. } => "waitlist",
            Self::AlreadyBooked => "already-booked",
            Self::Closed(_) => "closed",
            Self::NotFound => "not-found",
        }
    }
}

/// Resolves the available action for a located row.
pub fn resolve(row: &TimeTableRow) -> ActionOutcome {
    if let Some(link) = find_link(row, |label| label.contains(RESERVE_LABEL)) {
        return ActionOutcome::Reserve(link);
    }

    if let Some(link) = find_link(row, |label| WAITLIST_LABELS.iter().any(|w| label.contains(w))) {
        return ActionOutcome::Waitlist { via: WaitlistVia::Link(link), confirm_dialog: true };
    }

    if find_link(row, |label| CANCEL_LABELS.iter().any(|c| label.contains(c))).is_some() {
        return ActionOutcome::AlreadyBooked;
    }

    if row.course.as_ref().is_some_and(CourseInfo::is_full) {
        if let Some(checkbox) = &row.checkbox {
            return ActionOutcome::Waitlist {
                via: WaitlistVia::Checkbox(checkbox.clone()),
                confirm_dialog: false,
            };
        }
        // Some layouts hang the waitlist handler on the row element.
        if let Some(onclick) = &row.row_onclick {
            return ActionOutcome::Waitlist {
                via: WaitlistVia::Link(RowLink {
                    label: row.time_label.clone().unwrap_or_else(|| "row".to_string()),
                    href: None,
                    onclick: Some(onclick.clone()),
                }),
                confirm_dialog: false,
            };
        }
    }

    ActionOutcome::Closed(row.summary())
}

fn find_link(row: &TimeTableRow, pred: impl Fn(&str) -> bool) -> Option<RowLink> {
    row.links.iter().find(|l| pred(&l.label)).cloned()
}
