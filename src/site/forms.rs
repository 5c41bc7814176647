//! Form reading and submission planning.
//!
//! Every state change on the site is an old-fashioned form round-trip: read
//! the rendered fields, override the ones being "typed" or "clicked", and
//! send them back. A [`SubmitPlan`] is the pure description of one such
//! round-trip; executing it is the session's job.

use html_scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use super::errors::SiteError;
use super::labels::{PASSWORD_FIELDS, SUBMIT_EXACT, SUBMIT_LABELS, USERNAME_FIELDS};

static FORM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("form").unwrap());
static INPUT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input").unwrap());
static SELECT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("select").unwrap());
static OPTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option").unwrap());
static BUTTON: LazyLock<Selector> = LazyLock::new(|| Selector::parse("button").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

/// Everything needed to reproduce one form submission over HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPlan {
    /// Form action, relative to the page it was read from.
    pub action: Option<String>,
    pub method: FormMethod,
    pub params: Vec<(String, String)>,
    /// Label of the control standing in for the click, for logging.
    pub control: Option<String>,
}

/// Builds the login submission: the form carrying the member name and
/// number fields, with credentials filled in.
pub fn login_plan(doc: &Html, username: &str, password: &str) -> Result<SubmitPlan, SiteError> {
    for form in doc.select(&FORM) {
        let Some(user_field) = find_field_name(form, &USERNAME_FIELDS) else {
            continue;
        };
        let Some(pass_field) = find_field_name(form, &PASSWORD_FIELDS) else {
            continue;
        };

        let mut plan = base_plan(form);
        set_param(&mut plan.params, &user_field, username);
        set_param(&mut plan.params, &pass_field, password);

        // Browsers include the clicked submit control's own pair.
        if let Some(submit) = submit_controls(form).into_iter().next() {
            plan.control = Some(control_label(submit));
            push_control(&mut plan.params, submit);
        }
        return Ok(plan);
    }
    Err(SiteError::MissingElement("login form"))
}

/// Reproduces clicking the labeled confirm control on the current page:
/// a submit-shaped element reading 예약, 확인, 등록 or `Submit`. Falls back
/// to submitting the first form bare; `None` when the page has no form.
pub fn submit_plan(doc: &Html) -> Option<SubmitPlan> {
    for form in doc.select(&FORM) {
        for control in submit_controls(form).into_iter().chain(form.select(&BUTTON)) {
            let label = control_label(control);
            if SUBMIT_LABELS.iter().any(|l| label.contains(l)) || label == SUBMIT_EXACT {
                let mut plan = base_plan(form);
                plan.control = Some(label);
                push_control(&mut plan.params, control);
                return Some(plan);
            }
        }
    }
    doc.select(&FORM).next().map(base_plan)
}

/// Builds the checkbox waitlist submission: the form containing the named
/// checkbox, with that checkbox forced on.
pub fn checkbox_plan(doc: &Html, name: &str, value: &str) -> Result<SubmitPlan, SiteError> {
    for form in doc.select(&FORM) {
        let holds_checkbox = form.select(&INPUT).any(|input| {
            input.attr("type").unwrap_or("text").eq_ignore_ascii_case("checkbox")
                && input.attr("name") == Some(name)
        });
        if !holds_checkbox {
            continue;
        }
        let mut plan = base_plan(form);
        set_param(&mut plan.params, name, value);
        if let Some(submit) = submit_controls(form).into_iter().next() {
            plan.control = Some(control_label(submit));
            push_control(&mut plan.params, submit);
        }
        return Ok(plan);
    }
    Err(SiteError::MissingElement("waitlist checkbox form"))
}

/// Reproduces `document.<form>.<field>.value = v; ...; submit()` from a
/// parsed inline handler.
pub fn scripted_plan(
    doc: &Html,
    form_name: Option<&str>,
    sets: &[(String, String)],
) -> Result<SubmitPlan, SiteError> {
    let form = doc
        .select(&FORM)
        .find(|f| form_name.is_some() && f.attr("name") == form_name)
        .or_else(|| doc.select(&FORM).next())
        .ok_or(SiteError::MissingElement("form for scripted submission"))?;

    let mut plan = base_plan(form);
    for (field, value) in sets {
        set_param(&mut plan.params, field, value);
    }
    Ok(plan)
}

fn base_plan(form: ElementRef<'_>) -> SubmitPlan {
    let method = match form.attr("method") {
        Some(m) if m.eq_ignore_ascii_case("post") => FormMethod::Post,
        _ => FormMethod::Get,
    };
    SubmitPlan {
        action: form.attr("action").map(str::to_string),
        method,
        params: form_fields(form),
        control: None,
    }
}

/// All submittable field values from one form, in document order.
fn form_fields(form: ElementRef<'_>) -> Vec<(String, String)> {
    let mut fields = Vec::new();

    for input in form.select(&INPUT) {
        let Some(name) = input.attr("name") else {
            continue;
        };
        let input_type = input.attr("type").unwrap_or("text").to_lowercase();

        // Buttons and images are only sent for the control actually clicked
        if matches!(input_type.as_str(), "submit" | "image" | "button" | "reset") {
            continue;
        }
        if matches!(input_type.as_str(), "radio" | "checkbox") && input.attr("checked").is_none() {
            continue;
        }

        let default = if input_type == "checkbox" { "on" } else { "" };
        fields.push((name.to_string(), input.attr("value").unwrap_or(default).to_string()));
    }

    for select in form.select(&SELECT) {
        let Some(name) = select.attr("name") else {
            continue;
        };
        let options: Vec<ElementRef<'_>> = select.select(&OPTION).collect();
        let chosen = options
            .iter()
            .find(|o| o.attr("selected").is_some())
            .or_else(|| options.first());
        if let Some(option) = chosen {
            let value = option
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| option.text().collect::<String>().trim().to_string());
            fields.push((name.to_string(), value));
        }
    }

    fields
}

/// Submit-shaped inputs of a form, in document order.
fn submit_controls(form: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    form.select(&INPUT)
        .filter(|input| {
            let t = input.attr("type").unwrap_or("text").to_lowercase();
            t == "submit" || t == "image"
        })
        .collect()
}

fn control_label(control: ElementRef<'_>) -> String {
    if let Some(value) = control.attr("value") {
        return value.trim().to_string();
    }
    control.text().collect::<String>().trim().to_string()
}

fn push_control(params: &mut Vec<(String, String)>, control: ElementRef<'_>) {
    if let Some(name) = control.attr("name") {
        params.push((name.to_string(), control.attr("value").unwrap_or_default().to_string()));
    }
}

fn set_param(params: &mut Vec<(String, String)>, name: &str, value: &str) {
    if let Some(existing) = params.iter_mut().find(|(n, _)| n == name) {
        existing.1 = value.to_string();
    } else {
        params.push((name.to_string(), value.to_string()));
    }
}

/// The input's `name`, located by `id` or `name` among the candidates.
fn find_field_name(form: ElementRef<'_>, candidates: &[&str]) -> Option<String> {
    for &candidate in candidates {
        let found = form.select(&INPUT).find(|input| {
            input.attr("id") == Some(candidate) || input.attr("name") == Some(candidate)
        });
        if let Some(input) = found {
            return input.attr("name").map(str::to_string);
        }
    }
    None
}
