//! Format predicates for the typed field kinds.
//!
//! Each predicate answers one question about one string and never fails. The
//! inference chain in [`VALIDATORS`] evaluates them in a fixed order; the
//! first hit decides the type.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::FieldType;

static DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{2}\.[0-9]{2}\.[0-9]{4}|[0-9]{4}-[0-9]{2}-[0-9]{2})$")
        .expect("date pattern compiles")
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+7 [0-9]{3} [0-9]{3} [0-9]{2} [0-9]{2}$").expect("phone pattern compiles")
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

const DATE_FORMATS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];

/// A single predicate in the inference chain.
pub type Validator = fn(&str) -> bool;

/// Inference chain, evaluated front to back. `Text` has no entry: it is what
/// remains when nothing here matches.
pub const VALIDATORS: [(FieldType, Validator); 3] = [
    (FieldType::Date, is_date),
    (FieldType::Phone, is_phone),
    (FieldType::Email, is_email),
];

/// `DD.MM.YYYY` or `YYYY-MM-DD` that also names an existing calendar day.
pub fn is_date(value: &str) -> bool {
    if !DATE_REGEX.is_match(value) {
        return false;
    }
    // Year 0 passes chrono but is not a valid year for either format.
    DATE_FORMATS.iter().any(|fmt| {
        NaiveDate::parse_from_str(value, fmt)
            .map(|date| date.year() >= 1)
            .unwrap_or(false)
    })
}

pub fn is_phone(value: &str) -> bool {
    PHONE_REGEX.is_match(value)
}

pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}
