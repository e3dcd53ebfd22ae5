use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic type of a single form field.
///
/// The set is closed: every raw value resolves to exactly one of these, with
/// [`FieldType::Text`] acting as the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// `DD.MM.YYYY` or `YYYY-MM-DD` naming a real calendar day.
    Date,
    /// `+7 DDD DDD DD DD`.
    Phone,
    /// `local@domain.tld`.
    Email,
    /// Anything else, including non-string values.
    Text,
}

impl FieldType {
    /// Every field type, in inference order.
    pub const ALL: [FieldType; 4] = [
        FieldType::Date,
        FieldType::Phone,
        FieldType::Email,
        FieldType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Date => "date",
            FieldType::Phone => "phone",
            FieldType::Email => "email",
            FieldType::Text => "text",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a declared type name is not one of the known field types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field type `{0}`")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    /// Names are matched exactly; `"Email"` is not `"email"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| UnknownFieldType(s.to_string()))
    }
}
