//! Debug formatting helpers for [`custom_debug_derive`].

use std::fmt;

/// Masks a credential field so it never reaches logs or panic output.
///
/// Use with `#[debug(with = "crate::fmt::redacted")]` on secret fields.
pub fn redacted<T>(_value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("\"<redacted>\"")
}

/// Masks an optional credential, still showing whether it was set at all.
pub fn redacted_opt<T>(value: &Option<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Some(_) => f.write_str("Some(\"<redacted>\")"),
        None => f.write_str("None"),
    }
}
