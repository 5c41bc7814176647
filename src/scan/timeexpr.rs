//! Clock-time matching against timetable text.
//!
//! The schedule renders times in several shapes: `10:30`, a full-width
//! colon `10：30`, `10시30분` with or without a space, and with `오전`,
//! `오후`, `AM` or `PM` prefixes. Neighboring half-hour slots share digits
//! with the target (`09:30` contains `9:30`), so adjacent-hour times are
//! rejected before any positive match is considered.

use std::sync::LazyLock;

use regex::Regex;

static CLOCK_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}[:：]\d{2}").unwrap());

/// Counts clock-shaped tokens in a block of text. The locator uses this to
/// pick the schedule table when no cell text matches directly.
pub fn clock_token_count(text: &str) -> usize {
    CLOCK_TOKEN.find_iter(text).count()
}

/// Decides whether a text fragment denotes one specific class time.
///
/// Exclusion patterns for the numerically adjacent hours are checked first
/// and always win, so a row mentioning `09:30` is never mistaken for the
/// `10:30` slot no matter what else the row contains.
#[derive(Debug, Clone)]
pub struct TimeMatcher {
    label: String,
    hour: u32,
    minutes: u32,
    include: Regex,
    exclude: Regex,
}

impl TimeMatcher {
    /// Builds a matcher for a `HH:MM` target. Returns `None` for strings
    /// that do not parse as a clock time.
    pub fn new(target: &str) -> Option<Self> {
        let label = target.trim().replace('：', ":");
        let (h, m) = label.split_once(':')?;
        let hour: u32 = h.trim().parse().ok()?;
        let minutes: u32 = m.trim().parse().ok()?;
        if hour > 23 || minutes > 59 {
            return None;
        }

        let hf = hour_fragment(hour);
        let mf = minute_fragment(minutes);
        let include = Regex::new(&format!(
            r"(?:^|[^0-9])(?:{hf}:{mf}(?:[^0-9]|$)|{hf}시\s*{mf}분)"
        ))
        .ok()?;

        let prev = hour_fragment((hour + 23) % 24);
        let next = hour_fragment((hour + 1) % 24);
        let exclude = Regex::new(&format!(
            r"(?:^|[^0-9])(?:(?:{prev}|{next}):{mf}(?:[^0-9]|$)|(?:{prev}|{next})시\s*{mf}분)"
        ))
        .ok()?;

        Some(Self { label, hour, minutes, include, exclude })
    }

    /// The canonical `H:MM` label this matcher was built from, as reported
    /// in logs and the run result.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matches(&self, text: &str) -> bool {
        let text = text.replace('：', ":");
        if self.exclude.is_match(&text) {
            return false;
        }
        self.include.is_match(&text)
    }

    /// Loose containment check for verification sweeps over whole pages,
    /// where neighboring times legitimately appear alongside the target.
    /// The bare `H:MM` form is a substring of its zero-padded rendering,
    /// so one check covers both.
    pub fn appears_in(&self, text: &str) -> bool {
        let text = text.replace('：', ":");
        text.contains(&format!("{}:{:02}", self.hour, self.minutes))
            || text.contains(&format!("{}시{:02}분", self.hour, self.minutes))
    }
}

// Digit boundaries are expressed by consuming one non-digit on either side
// rather than look-around, which the regex crate does not support. A `분`
// suffix bounds the minutes on its own.
fn hour_fragment(hour: u32) -> String {
    if hour < 10 { format!("0?{hour}") } else { hour.to_string() }
}

fn minute_fragment(minutes: u32) -> String {
    if minutes < 10 { format!("0?{minutes}") } else { minutes.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> TimeMatcher {
        TimeMatcher::new("10:30").unwrap()
    }

    #[test]
    fn accepts_the_canonical_forms() {
        let m = matcher();
        for text in [
            "10:30",
            "오전 10:30",
            "AM 10:30",
            "10：30",
            "10시30분",
            "10시 30분",
            "오전 10시 30분",
            "10:30~11:20 바렐 체어",
        ] {
            assert!(m.matches(text), "expected a match for {text:?}");
        }
    }

    #[test]
    fn rejects_adjacent_hours_sharing_minutes() {
        let m = matcher();
        for text in [
            "09:30",
            "9:30",
            "오전 09:30",
            "09시30분",
            "9시 30분",
            "11:30",
            "11시30분",
            "09:30 체어 필라테스 (3/8)",
        ] {
            assert!(!m.matches(text), "expected no match for {text:?}");
        }
    }

    #[test]
    fn exclusion_wins_when_both_times_appear() {
        let m = matcher();
        assert!(!m.matches("09:30 매트 / 10:30 바렐"));
    }

    #[test]
    fn requires_digit_boundaries() {
        let m = matcher();
        assert!(!m.matches("110:30"));
        assert!(!m.matches("10:300"));
        assert!(!m.matches("210:30 something"));
        assert!(m.matches("수업 10:30."));
    }

    #[test]
    fn unrelated_times_do_not_match() {
        let m = matcher();
        assert!(!m.matches("10:20"));
        assert!(!m.matches("19:30"));
        assert!(!m.matches("바렐 체어 (4/8)"));
    }

    #[test]
    fn single_digit_hours_match_padded_and_bare() {
        let m = TimeMatcher::new("9:30").unwrap();
        assert!(m.matches("09:30"));
        assert!(m.matches("9:30"));
        assert!(m.matches("9시 30분"));
        assert!(!m.matches("10:30"));
        assert!(!m.matches("08:30"));
        assert!(!m.matches("19:30"));
    }

    #[test]
    fn rejects_unparseable_targets() {
        assert!(TimeMatcher::new("25:10").is_none());
        assert!(TimeMatcher::new("10:75").is_none());
        assert!(TimeMatcher::new("half past ten").is_none());
        assert!(TimeMatcher::new("").is_none());
    }

    #[test]
    fn loose_containment_ignores_neighbor_exclusion() {
        let m = matcher();
        assert!(m.appears_in("09:30 매트, 10:30 바렐 체어"));
        assert!(m.appears_in("2026-9-1 10시30분 예약"));
        assert!(m.appears_in("* 10：30"));
        assert!(!m.appears_in("09:30 매트"));

        let early = TimeMatcher::new("9:30").unwrap();
        assert!(early.appears_in("예약 09:30"));
        assert!(early.appears_in("예약 9:30"));
    }

    #[test]
    fn counts_clock_tokens() {
        assert_eq!(clock_token_count("09:30 10:30 11:30"), 3);
        assert_eq!(clock_token_count("10：30 full width"), 1);
        assert_eq!(clock_token_count("no times here"), 0);
    }
}
