//! Target date computation and the opening-time gate.
//!
//! All date math happens in Korean local time. The booking site opens a
//! class date exactly one week ahead, so the target is always "today in
//! Seoul plus seven days" regardless of where the process runs.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use chrono_tz::Asia::Seoul;
use chrono_tz::Tz;
use tracing::info;

const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);
const COUNTDOWN_WINDOW: Duration = Duration::seconds(10);

/// The class date a run is aimed at, resolved in Korean local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub weekday: Weekday,
}

impl TargetDate {
    /// Resolves the booking target: the moment `now` in Seoul, plus one week.
    pub fn compute(now: DateTime<Utc>) -> Self {
        let kst = now.with_timezone(&Seoul) + Duration::days(7);
        Self {
            year: kst.year(),
            month: kst.month(),
            day: kst.day(),
            weekday: kst.weekday(),
        }
    }

    pub fn from_current_time() -> Self {
        Self::compute(Utc::now())
    }

    /// True when the target falls on a Saturday or Sunday. The studio runs
    /// no weekend classes, so such runs skip booking entirely.
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday, Weekday::Sat | Weekday::Sun)
    }

    /// Unpadded `YYYY-M-D` form, matching how the site's calendar links and
    /// the result report spell dates.
    pub fn date_string(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }

    /// The `M월 D일` form the site uses in reservation history rows.
    pub fn korean_label(&self) -> String {
        format!("{}월 {}일", self.month, self.day)
    }

    pub fn day_label(&self) -> &'static str {
        match self.weekday {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }
}

impl std::fmt::Display for TargetDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.date_string(), self.day_label())
    }
}

/// Parses an `HH:MM` clock string as used by `OPEN_TIME` and `TARGET_TIME`.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// Time left until `open` on the current Seoul day, or `None` once the
/// window is already open.
fn remaining_until(now: DateTime<Tz>, open: NaiveTime) -> Option<Duration> {
    let target = now.date_naive().and_time(open).and_local_timezone(Seoul).single()?;
    let remaining = target - now;
    (remaining > Duration::zero()).then_some(remaining)
}

/// Sleeps until the booking window opens in Korean local time, logging a
/// one-per-second countdown over the final stretch. Returns immediately
/// when today's opening time has already passed.
pub async fn wait_until_open(open: NaiveTime) {
    let now = Utc::now().with_timezone(&Seoul);
    let Some(remaining) = remaining_until(now, open) else {
        info!(open = %open, now = %now.time(), "booking window already open");
        return;
    };

    info!(
        open = %open,
        minutes = remaining.num_minutes(),
        seconds = remaining.num_seconds() % 60,
        "waiting for the booking window"
    );

    let mut last_announced: Option<i64> = None;
    loop {
        let now = Utc::now().with_timezone(&Seoul);
        let Some(remaining) = remaining_until(now, open) else {
            info!(open = %open, "booking window open");
            return;
        };

        if remaining <= COUNTDOWN_WINDOW {
            let seconds_left = (remaining.num_milliseconds() + 999) / 1000;
            if last_announced != Some(seconds_left) {
                info!(seconds_left, "booking window opens shortly");
                last_announced = Some(seconds_left);
            }
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn target_is_seven_days_ahead_in_seoul() {
        // 01:30 UTC is 10:30 in Seoul on the same Tuesday.
        let target = TargetDate::compute(utc(2026, 8, 25, 1, 30));
        assert_eq!((target.year, target.month, target.day), (2026, 9, 1));
        assert_eq!(target.weekday, Weekday::Tue);
        assert!(!target.is_weekend());
    }

    #[test]
    fn utc_evening_rolls_into_the_next_seoul_day() {
        // 20:00 UTC on a Friday is already Saturday morning in Seoul.
        let target = TargetDate::compute(utc(2026, 8, 21, 20, 0));
        assert_eq!((target.month, target.day), (8, 29));
        assert_eq!(target.weekday, Weekday::Sat);
        assert!(target.is_weekend());
    }

    #[test]
    fn weekend_detection_is_independent_of_clock_time() {
        for (h, m, s) in [(0, 0, 1), (10, 30, 0), (23, 59, 59)] {
            let sunday = Seoul.with_ymd_and_hms(2026, 8, 23, h, m, s).unwrap();
            assert!(TargetDate::compute(sunday.with_timezone(&Utc)).is_weekend());

            let tuesday = Seoul.with_ymd_and_hms(2026, 8, 25, h, m, s).unwrap();
            assert!(!TargetDate::compute(tuesday.with_timezone(&Utc)).is_weekend());
        }
    }

    #[test]
    fn date_strings_are_unpadded() {
        let target = TargetDate::compute(utc(2026, 8, 25, 1, 30));
        assert_eq!(target.date_string(), "2026-9-1");
        assert_eq!(target.korean_label(), "9월 1일");
        assert_eq!(target.to_string(), "2026-9-1 (Tuesday)");
    }

    #[test]
    fn no_wait_once_the_window_is_open() {
        let open = NaiveTime::from_hms_opt(12, 0, 0).unwrap();

        let before = Seoul.with_ymd_and_hms(2026, 8, 25, 11, 59, 50).unwrap();
        assert_eq!(remaining_until(before, open), Some(Duration::seconds(10)));

        let at_noon = Seoul.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        assert_eq!(remaining_until(at_noon, open), None);

        let afternoon = Seoul.with_ymd_and_hms(2026, 8, 25, 15, 0, 0).unwrap();
        assert_eq!(remaining_until(afternoon, open), None);
    }

    #[test]
    fn clock_strings_parse_and_reject_garbage() {
        assert_eq!(parse_clock("10:30"), NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(parse_clock(" 12:00 "), NaiveTime::from_hms_opt(12, 0, 0));
        assert_eq!(parse_clock("noonish"), None);
        assert_eq!(parse_clock("25:00"), None);
    }
}
