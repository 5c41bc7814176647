//! Inline handler dispatch.
//!
//! Date cells and row actions carry `onclick` attributes and `javascript:`
//! hrefs. Nothing here is ever evaluated: a handler is parsed for one of
//! the shapes the site actually uses (a location assignment, a set of form
//! field writes followed by `submit()`, or a one-argument call into a page
//! function of those same shapes) and mapped onto an equivalent HTTP
//! request. Anything unrecognized resolves to `None`.

use std::sync::LazyLock;

use regex::Regex;

/// The HTTP request a click boils down to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Plain navigation to a (usually relative) URL.
    Get(String),
    /// Submit the named form after writing the given fields.
    FieldSubmit { form: Option<String>, sets: Vec<(String, String)> },
}

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:window\.|document\.|top\.)?location(?:\.href)?\s*=\s*['"]([^'"]+)['"]\s*(?:\+\s*(\w+))?"#,
    )
    .unwrap()
});
static FIELD_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"document\.(\w+)\.(\w+)\.value\s*=\s*(?:'([^']*)'|"([^"]*)"|(\w+))"#).unwrap()
});
static FORM_SUBMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"document\.(\w+)\.submit\s*\(\s*\)").unwrap());
static CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:javascript:\s*)?(?:return\s+)?([A-Za-z_]\w*)\s*\(\s*(?:'([^']*)'|"([^"]*)"|(\d+))?\s*\)"#)
        .unwrap()
});

/// Resolves what clicking a link would do. `page` is the raw page source,
/// searched for the definition of a called handler function.
pub fn resolve_click(href: Option<&str>, onclick: Option<&str>, page: &str) -> Option<Navigation> {
    if let Some(source) = onclick
        && let Some(nav) = resolve_script(source, page)
    {
        return Some(nav);
    }
    if let Some(href) = href {
        let href = href.trim();
        if let Some(payload) = href.strip_prefix("javascript:") {
            return resolve_script(payload, page);
        }
        if !href.is_empty() && href != "#" {
            return Some(Navigation::Get(href.to_string()));
        }
    }
    None
}

fn resolve_script(source: &str, page: &str) -> Option<Navigation> {
    if let Some(nav) = parse_statements(source, None) {
        return Some(nav);
    }

    let call = CALL.captures(source)?;
    let name = call.get(1)?.as_str();
    let arg = call.get(2).or_else(|| call.get(3)).or_else(|| call.get(4)).map(|m| m.as_str());

    let (param, body) = find_function(page, name)?;
    parse_statements(body, arg.map(|value| (param, value)))
}

/// Parses flat handler statements, substituting the function parameter
/// where it is referenced.
fn parse_statements(source: &str, param: Option<(&str, &str)>) -> Option<Navigation> {
    if let Some(c) = LOCATION.captures(source) {
        let prefix = c.get(1)?.as_str();
        return match c.get(2) {
            None => Some(Navigation::Get(prefix.to_string())),
            Some(ident) => {
                let (name, value) = param?;
                (ident.as_str() == name).then(|| Navigation::Get(format!("{prefix}{value}")))
            }
        };
    }

    let form = FORM_SUBMIT.captures(source)?.get(1)?.as_str().to_string();
    let mut sets = Vec::new();
    for c in FIELD_SET.captures_iter(source) {
        let field = match c.get(2) {
            Some(m) => m.as_str().to_string(),
            None => continue,
        };
        let value = if let Some(lit) = c.get(3).or_else(|| c.get(4)) {
            lit.as_str().to_string()
        } else {
            let bare = c.get(5)?.as_str();
            match param {
                Some((name, value)) if bare == name => value.to_string(),
                _ if bare.chars().all(|ch| ch.is_ascii_digit()) => bare.to_string(),
                _ => continue,
            }
        };
        sets.push((field, value));
    }
    if sets.is_empty() {
        return None;
    }
    Some(Navigation::FieldSubmit { form: Some(form), sets })
}

/// Finds `function <name>(<param>) { <flat body> }` in the page source.
/// Bodies with nested braces are out of scope; those handlers resolve to
/// nothing and the caller falls back or reports the element unusable.
fn find_function<'a>(page: &'a str, name: &str) -> Option<(&'a str, &'a str)> {
    let def = Regex::new(&format!(
        r"function\s+{name}\s*\(\s*(\w*)[^)]*\)\s*\{{([^{{}}]*)\}}"
    ))
    .ok()?;
    let c = def.captures(page)?;
    Some((c.get(1)?.as_str(), c.get(2)?.as_str()))
}
