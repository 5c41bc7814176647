//! Modal dialog capture and classification.
//!
//! The site confirms, rejects and complains through inline `alert(...)`
//! calls embedded in each response. Every alert is captured in document
//! order into a FIFO queue the orchestrator drains at fixed checkpoints;
//! dialog content classifies the outcome of the preceding step but never
//! branches control anywhere else.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

use super::labels::{
    AUTH_REJECT_PHRASE, CONFLICT_PHRASES, DIALOG_SUCCESS_OUTCOMES, DIALOG_SUCCESS_SUBJECT,
    TIMEOUT_PHRASES,
};

static ALERT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"alert\s*\(\s*(?:'([^']*)'|"([^"]*)")\s*\)"#).unwrap()
});

/// Pulls the message text out of every inline `alert(...)` in a page.
pub fn extract_alerts(html: &str) -> Vec<String> {
    ALERT
        .captures_iter(html)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    /// The reservation (or waitlist entry) went through.
    Success,
    /// Simultaneous-submission contention; retry after backing off.
    ConflictRetry,
    /// Server-side session timed out mid-flow.
    SessionTimeout,
    /// The account is not registered; no retry can help.
    AuthRejected,
    Other,
}

impl DialogKind {
    pub fn classify(text: &str) -> Self {
        if CONFLICT_PHRASES.iter().any(|p| text.contains(p)) {
            return Self::ConflictRetry;
        }
        if TIMEOUT_PHRASES.iter().any(|p| text.contains(p)) {
            return Self::SessionTimeout;
        }
        if text.contains(AUTH_REJECT_PHRASE) {
            return Self::AuthRejected;
        }
        if text.contains(DIALOG_SUCCESS_SUBJECT)
            && DIALOG_SUCCESS_OUTCOMES.iter().any(|p| text.contains(p))
        {
            return Self::Success;
        }
        Self::Other
    }
}

/// One captured dialog, already acknowledged as far as the site knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub text: String,
    pub kind: DialogKind,
}

/// FIFO queue of dialogs observed since the last drain.
#[derive(Debug, Default)]
pub struct DialogQueue {
    pending: VecDeque<Dialog>,
}

impl DialogQueue {
    pub fn push(&mut self, text: String) {
        let kind = DialogKind::classify(&text);
        self.pending.push_back(Dialog { text, kind });
    }

    /// Takes every pending dialog, oldest first.
    pub fn drain(&mut self) -> Vec<Dialog> {
        self.pending.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_alerts_in_document_order() {
        let html = r#"<html><head><script>
            alert('시간초과 입니다');
        </script></head><body>
        <script type="text/javascript">alert("예약이 완료 되었습니다.");</script>
        </body></html>"#;
        assert_eq!(
            extract_alerts(html),
            vec!["시간초과 입니다".to_string(), "예약이 완료 되었습니다.".to_string()]
        );
    }

    #[test]
    fn ignores_pages_without_alerts() {
        assert!(extract_alerts("<html><body>schedule</body></html>").is_empty());
        assert!(extract_alerts("alert()").is_empty());
    }

    #[test]
    fn classifies_conflict_and_timeout() {
        assert_eq!(
            DialogKind::classify("동시신청으로 인한 오류입니다. 잠시 후 다시 시도하세요."),
            DialogKind::ConflictRetry
        );
        assert_eq!(DialogKind::classify("잠시 후 다시 시도해 주세요"), DialogKind::ConflictRetry);
        assert_eq!(DialogKind::classify("시간초과 입니다"), DialogKind::SessionTimeout);
        assert_eq!(DialogKind::classify("session time out"), DialogKind::SessionTimeout);
    }

    #[test]
    fn classifies_success_and_auth() {
        assert_eq!(DialogKind::classify("예약이 완료 되었습니다."), DialogKind::Success);
        assert_eq!(DialogKind::classify("대기예약 등록 되었습니다"), DialogKind::Success);
        assert_eq!(
            DialogKind::classify("회원으로 등록되어 있지 않습니다."),
            DialogKind::AuthRejected
        );
        assert_eq!(DialogKind::classify("안내말씀 드립니다"), DialogKind::Other);
    }

    #[test]
    fn auth_rejection_wins_over_success_wording() {
        // Mentions both a reservation and "등록" but is a login failure.
        assert_eq!(
            DialogKind::classify("예약 회원으로 등록되어 있지 않습니다"),
            DialogKind::AuthRejected
        );
    }

    #[test]
    fn queue_drains_fifo_and_empties() {
        let mut queue = DialogQueue::default();
        queue.push("시간초과".to_string());
        queue.push("예약 완료".to_string());
        assert!(!queue.is_empty());

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind, DialogKind::SessionTimeout);
        assert_eq!(drained[1].kind, DialogKind::Success);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }
}
