//! Course label parsing.
//!
//! Timetable cells describe a class as `이름(강사)(현재/정원)`, with the
//! instructor group optional. Anything without a well-formed enrollment
//! fraction is not a course label.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static PAREN_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]*)\)").unwrap());
static FRACTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s*/\s*\d+$").unwrap());

/// A class offering extracted from one timetable cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseInfo {
    pub name: String,
    pub instructor: Option<String>,
    pub current: u32,
    pub max: u32,
}

impl CourseInfo {
    /// Parses a composite course label. Returns `None` when no enrollment
    /// fraction is present or the fraction is malformed (including a zero
    /// capacity), never panics on arbitrary text.
    pub fn parse(label: &str) -> Option<Self> {
        let groups: Vec<(usize, &str)> = PAREN_GROUP
            .captures_iter(label)
            .filter_map(|c| Some((c.get(0)?.start(), c.get(1)?.as_str())))
            .collect();

        let fraction_idx = groups.iter().position(|(_, inner)| FRACTION.is_match(inner))?;
        let (current, max) = groups[fraction_idx].1.split_once('/')?;
        let current: u32 = current.trim().parse().ok()?;
        let max: u32 = max.trim().parse().ok()?;
        if max == 0 {
            return None;
        }

        let name_end = groups.first().map(|(start, _)| *start).unwrap_or(label.len());
        let name = label[..name_end].trim().to_string();
        let instructor = (fraction_idx > 0)
            .then(|| groups[fraction_idx - 1].1.trim().to_string())
            .filter(|s| !s.is_empty());

        Some(Self { name, instructor, current, max })
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }
}

impl fmt::Display for CourseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.current, self.max)
    }
}
