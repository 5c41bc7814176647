//! Timetable scanning.
//!
//! The per-date schedule is plain server-rendered HTML whose exact shape
//! has changed several times. The locator makes a deterministic pure pass
//! over the parsed document: cell-level matching first, then a densest-
//! table fallback for layouts that split or merge the time column.

pub mod action;
pub mod capacity;
pub mod timeexpr;

use html_scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use capacity::CourseInfo;
use timeexpr::{TimeMatcher, clock_token_count};

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static CHECKBOX: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input[type='checkbox']").unwrap());

/// An anchor found inside a timetable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLink {
    pub label: String,
    pub href: Option<String>,
    pub onclick: Option<String>,
}

/// A checkbox control, the fallback waitlist path on full classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCheckbox {
    pub name: String,
    pub value: String,
}

/// One schedule row matching the target time, lifted out of the document.
///
/// Owns plain strings only, so it can cross `await` points freely while the
/// parsed document stays behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeTableRow {
    pub cells: Vec<String>,
    pub time_label: Option<String>,
    pub course: Option<CourseInfo>,
    pub links: Vec<RowLink>,
    pub checkbox: Option<RowCheckbox>,
    /// Handler on the `<tr>` itself; some layouts make the whole row the
    /// waitlist control.
    pub row_onclick: Option<String>,
}

impl TimeTableRow {
    pub fn summary(&self) -> String {
        self.cells.join(" | ")
    }
}

/// Finds the row for one class time in a rendered schedule page.
pub struct SlotLocator<'a> {
    matcher: &'a TimeMatcher,
}

impl<'a> SlotLocator<'a> {
    pub fn new(matcher: &'a TimeMatcher) -> Self {
        Self { matcher }
    }

    /// First row in document order with a cell matching the target time.
    ///
    /// When no cell matches anywhere, falls back to the table containing
    /// the most clock-shaped tokens and rescans it row-by-row, catching
    /// layouts where the time sits in a header cell or spans markup.
    pub fn locate(&self, doc: &Html) -> Option<TimeTableRow> {
        for table in doc.select(&TABLE) {
            for tr in table.select(&TR) {
                let matched = tr
                    .select(&TD)
                    .map(|td| collapsed_text(td))
                    .find(|text| self.matcher.matches(text));
                if let Some(time_label) = matched {
                    return Some(self.lift_row(tr, Some(time_label)));
                }
            }
        }

        let densest = doc
            .select(&TABLE)
            .max_by_key(|table| clock_token_count(&collapsed_text(*table)))?;
        if clock_token_count(&collapsed_text(densest)) == 0 {
            return None;
        }
        for tr in densest.select(&TR) {
            if self.matcher.matches(&collapsed_text(tr)) {
                return Some(self.lift_row(tr, None));
            }
        }
        None
    }

    fn lift_row(&self, tr: ElementRef<'_>, time_label: Option<String>) -> TimeTableRow {
        let cells: Vec<String> = tr.select(&TD).map(|td| collapsed_text(td)).collect();

        let course = cells.iter().find_map(|cell| CourseInfo::parse(cell));

        let links = tr
            .select(&ANCHOR)
            .map(|a| RowLink {
                label: collapsed_text(a),
                href: a.attr("href").map(str::to_string),
                onclick: a.attr("onclick").map(str::to_string),
            })
            .collect();

        let checkbox = tr.select(&CHECKBOX).next().and_then(|input| {
            Some(RowCheckbox {
                name: input.attr("name")?.to_string(),
                value: input.attr("value").unwrap_or("on").to_string(),
            })
        });

        let row_onclick = tr.attr("onclick").map(str::to_string);

        TimeTableRow { cells, time_label, course, links, checkbox, row_onclick }
    }
}

/// Element text with runs of whitespace collapsed to single spaces.
pub fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(html: &str) -> Option<TimeTableRow> {
        let matcher = TimeMatcher::new("10:30").unwrap();
        let doc = Html::parse_document(html);
        SlotLocator::new(&matcher).locate(&doc)
    }

    #[test]
    fn finds_the_target_row_and_skips_neighbors() {
        let html = r##"<table>
            <tr><td>09:30</td><td>매트 필라테스(3/8)</td><td><a href="#">예약하기</a></td></tr>
            <tr><td>10:30</td><td>바렐 체어(승정쌤)(4/8)</td><td><a href="res.php?no=3">예약하기</a></td></tr>
            <tr><td>11:30</td><td>요가(2/8)</td><td><a href="#">예약하기</a></td></tr>
        </table>"##;
        let row = locate(html).unwrap();
        assert_eq!(row.time_label.as_deref(), Some("10:30"));
        let course = row.course.unwrap();
        assert_eq!(course.name, "바렐 체어");
        assert_eq!((course.current, course.max), (4, 8));
        assert_eq!(row.links.len(), 1);
        assert_eq!(row.links[0].href.as_deref(), Some("res.php?no=3"));
    }

    #[test]
    fn first_match_across_multiple_tables_wins() {
        let html = r#"
            <table><tr><td>공지사항</td></tr></table>
            <table>
                <tr><td>오전 10:30</td><td>첫번째</td></tr>
            </table>
            <table>
                <tr><td>10:30</td><td>두번째</td></tr>
            </table>"#;
        let row = locate(html).unwrap();
        assert_eq!(row.cells[1], "첫번째");
    }

    #[test]
    fn falls_back_to_the_densest_table_for_split_markup() {
        // No single cell holds the time, but the schedule table still has
        // the most clock tokens; row-level matching picks it up.
        let html = r#"
            <table><tr><td>메뉴</td></tr></table>
            <table>
                <tr><th>오전 10:30</th><td>바렐 체어(4/8)</td><td><a onclick="res(3)">예약하기</a></td></tr>
                <tr><th>오전 11:20</th><td>매트(2/8)</td></tr>
            </table>"#;
        let row = locate(html).unwrap();
        assert_eq!(row.time_label, None);
        assert_eq!(row.course.as_ref().unwrap().name, "바렐 체어");
        assert_eq!(row.links[0].onclick.as_deref(), Some("res(3)"));
    }

    #[test]
    fn nothing_matches_when_the_slot_is_absent() {
        let html = r#"<table>
            <tr><td>09:30</td><td>매트(3/8)</td></tr>
            <tr><td>19:30</td><td>야간(3/8)</td></tr>
        </table>"#;
        assert!(locate(html).is_none());
    }

    #[test]
    fn no_tables_means_not_found() {
        assert!(locate("<html><body><p>점검 중입니다</p></body></html>").is_none());
    }

    #[test]
    fn lifts_checkbox_controls() {
        let html = r#"<table><tr>
            <td>10:30</td>
            <td>바렐 체어(8/8)</td>
            <td><input type="checkbox" name="wait_chk" value="3"></td>
        </tr></table>"#;
        let row = locate(html).unwrap();
        assert_eq!(
            row.checkbox,
            Some(RowCheckbox { name: "wait_chk".to_string(), value: "3".to_string() })
        );
        assert!(row.links.is_empty());
        assert_eq!(row.row_onclick, None);
    }

    #[test]
    fn lifts_the_row_level_handler() {
        let html = r#"<table><tr onclick="wait_go(3)">
            <td>10:30</td><td>바렐 체어(8/8)</td>
        </tr></table>"#;
        let row = locate(html).unwrap();
        assert_eq!(row.row_onclick.as_deref(), Some("wait_go(3)"));
    }

    #[test]
    fn collapses_whitespace_inside_cells() {
        let html = "<table><tr><td>  오전\n  10:30 </td><td>바렐\n체어(4/8)</td></tr></table>";
        let row = locate(html).unwrap();
        assert_eq!(row.time_label.as_deref(), Some("오전 10:30"));
        assert_eq!(row.course.as_ref().unwrap().name, "바렐 체어");
    }
}
