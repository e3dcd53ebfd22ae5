//! # formfit field inference (`infer`)
//!
//! Classifies raw form values into one of four semantic [`FieldType`]s. The
//! matcher relies on this to turn an untyped submission into the
//! `(field name, field type)` pairs it looks up in the template index.
//!
//! ## Inference order
//!
//! Strings are tested against a fixed chain of predicates; the first one that
//! accepts the value wins:
//!
//! 1. `date` : `DD.MM.YYYY` or `YYYY-MM-DD`, and a real calendar day
//! 2. `phone`: `+7 DDD DDD DD DD`
//! 3. `email`: `local@domain.tld`
//! 4. `text` : fallback
//!
//! Non-string JSON values (numbers, booleans, null, arrays, objects) are
//! always `text`. Inference never fails.
//!
//! ```
//! use infer::{infer_str, infer_value, FieldType};
//! use serde_json::json;
//!
//! assert_eq!(infer_str("1990-01-01"), FieldType::Date);
//! assert_eq!(infer_str("+7 999 123 45 67"), FieldType::Phone);
//! assert_eq!(infer_str("user@example.com"), FieldType::Email);
//! assert_eq!(infer_str("31.02.2020"), FieldType::Text);
//! assert_eq!(infer_value(&json!(42)), FieldType::Text);
//! ```

mod types;
pub mod validators;

pub use crate::types::{FieldType, UnknownFieldType};
pub use crate::validators::{is_date, is_email, is_phone};

use serde_json::Value;

/// Infer the semantic type of a string value.
pub fn infer_str(value: &str) -> FieldType {
    validators::VALIDATORS
        .iter()
        .find(|(_, accepts)| accepts(value))
        .map(|(ty, _)| *ty)
        .unwrap_or(FieldType::Text)
}

/// Infer the semantic type of an arbitrary JSON value.
pub fn infer_value(value: &Value) -> FieldType {
    match value {
        Value::String(s) => infer_str(s),
        _ => FieldType::Text,
    }
}

/// Check a value against one specific type, without falling through the chain.
///
/// Every string is valid `text`.
pub fn validate(field_type: FieldType, value: &str) -> bool {
    let valid = match field_type {
        FieldType::Date => is_date(value),
        FieldType::Phone => is_phone(value),
        FieldType::Email => is_email(value),
        FieldType::Text => true,
    };
    tracing::trace!(%field_type, valid, "validated single value");
    valid
}
