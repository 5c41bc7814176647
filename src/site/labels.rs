//! Paths, selectors and Korean phrases recognized on the booking site.
//!
//! The markup has drifted over the years, so label matching is by
//! containment over the union of every variant observed in the wild
//! rather than exact comparison.

/// Calendar view; doubles as the login page when no session cookie is set.
pub const CALENDAR_PATH: &str = "/yeapp/yeapp.php?tm=102";
/// Reservation history view, used to corroborate a booking.
pub const HISTORY_PATH: &str = "/yeapp/yeapp.php?tm=103";
/// Path fragment of the booking form page reached after login.
pub const BOOKING_FORM_MARKER: &str = "res_postform.php";
/// A logout link only renders for authenticated sessions.
pub const LOGGED_IN_SELECTOR: &str = "a[href*='yeout.php']";

/// Login form fields, by `id` or `name` attribute, in preference order.
pub const USERNAME_FIELDS: [&str; 2] = ["user_id", "name"];
pub const PASSWORD_FIELDS: [&str; 1] = ["passwd"];

/// Browser identity and locale presented to the site.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const ACCEPT_LANGUAGE: &str = "ko-KR,ko;q=0.9";

/// Row action labels, in resolution priority order.
pub const RESERVE_LABEL: &str = "예약하기";
pub const WAITLIST_LABELS: [&str; 2] = ["대기예약", "대기"];
pub const CANCEL_LABELS: [&str; 2] = ["삭제", "취소"];

/// Labels accepted on the final submit control.
pub const SUBMIT_LABELS: [&str; 3] = ["예약", "확인", "등록"];
pub const SUBMIT_EXACT: &str = "Submit";

/// Completion phrases the site renders after a successful reservation.
pub const SUCCESS_PHRASES: [&str; 9] = [
    "예약완료",
    "예약 완료",
    "예약이 완료",
    "예약되었습니다",
    "예약 되었습니다",
    "정상적으로 예약",
    "대기예약 완료",
    "대기 예약",
    "예약신청이 완료",
];

/// Dialog fragments meaning another member submitted at the same moment.
pub const CONFLICT_PHRASES: [&str; 2] = ["동시신청", "잠시 후"];
/// Dialog fragments meaning the server-side session expired.
pub const TIMEOUT_PHRASES: [&str; 2] = ["시간초과", "time out"];
/// Dialog fragment meaning the credentials are not registered.
pub const AUTH_REJECT_PHRASE: &str = "등록되어 있지 않습니다";
/// A success dialog mentions a reservation plus one of these outcomes.
pub const DIALOG_SUCCESS_SUBJECT: &str = "예약";
pub const DIALOG_SUCCESS_OUTCOMES: [&str; 3] = ["완료", "성공", "등록"];

/// Calendar cell marker for a day that can no longer be selected.
pub const UNAVAILABLE_MARK: char = 'X';
/// Marker shown next to waitlisted entries in the calendar and history.
pub const WAITLIST_MARK: char = '*';
