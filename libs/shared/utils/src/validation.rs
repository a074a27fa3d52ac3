use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use shared_models::validation::ValidationErrors;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

fn label(field: &str) -> String {
    field.replace('_', " ")
}

/// Records a "required" error for a missing or blank value and returns the trimmed value.
pub fn required<'a>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.add(field, format!("The {} field is required.", label(field)));
            None
        }
    }
}

pub fn max_length(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("The {} may not be greater than {} characters.", label(field), max),
        );
    }
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    let re = EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok());
    email.len() <= 254 && re.as_ref().is_some_and(|re| re.is_match(email))
}

pub fn email(errors: &mut ValidationErrors, field: &str, value: &str) {
    if !is_valid_email(value) {
        errors.add(field, format!("The {} must be a valid email address.", label(field)));
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

pub fn date(errors: &mut ValidationErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    let parsed = parse_date(raw);
    if parsed.is_none() {
        errors.add(field, format!("The {} is not a valid date.", label(field)));
    }
    parsed
}
