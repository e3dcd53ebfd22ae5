use std::collections::BTreeMap;

use index::{FieldType, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// A submitted form: field name to raw value.
pub type FormSubmission = BTreeMap<String, JsonValue>;

/// Field name to inferred type, one entry per submitted field.
pub type InferredForm = BTreeMap<String, FieldType>;

/// Outcome of matching one submission.
///
/// "No match" is an ordinary outcome that still carries the inferred form as
/// diagnostic data, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        template_id: String,
        template_name: String,
    },
    Unmatched {
        inferred_form: InferredForm,
    },
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    /// Name of the selected template, if any.
    pub fn template_name(&self) -> Option<&str> {
        match self {
            MatchResult::Matched { template_name, .. } => Some(template_name),
            MatchResult::Unmatched { .. } => None,
        }
    }
}

/// Why a candidate template was or was not selected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum CandidateVerdict {
    /// Every template field is present with the same inferred type.
    Selected,
    /// The template declares more fields than were submitted.
    TooManyFields,
    /// A template field was not submitted.
    MissingField { name: String },
    /// A template field was submitted but inferred as another type.
    TypeMismatch {
        name: String,
        expected: FieldType,
        inferred: FieldType,
    },
    /// Ranked after the selected template, so never checked.
    NotEvaluated,
}

/// One candidate in a [`MatchReport`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateReport {
    pub template_id: String,
    pub template_name: String,
    pub field_count: usize,
    #[serde(flatten)]
    pub verdict: CandidateVerdict,
}

/// Full trace of one match: inferred types, ranked candidates, and the pick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchReport {
    pub inferred_form: InferredForm,
    /// Candidates in the order they were checked.
    pub candidates: Vec<CandidateReport>,
    pub selected: Option<CandidateReport>,
}

impl MatchReport {
    pub fn into_result(self) -> MatchResult {
        match self.selected {
            Some(selected) => MatchResult::Matched {
                template_id: selected.template_id,
                template_name: selected.template_name,
            },
            None => MatchResult::Unmatched {
                inferred_form: self.inferred_form,
            },
        }
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Template or index read failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
