//! # formfit Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` sits on top of the type inferencer (`infer`) and the store
//! (`index`). Given a submitted form it infers a [`FieldType`](index::FieldType)
//! per field, gathers candidate templates from the field index, and selects the
//! template whose every field is present with the same type.
//!
//! ## Core Types
//!
//! - [`FormSubmission`]: field name to raw JSON value.
//! - [`InferredForm`]: field name to inferred type.
//! - [`MatchResult`]: `Matched { template_id, template_name }` or
//!   `Unmatched { inferred_form }`. No match is a result, not an error.
//! - [`MatchReport`]: the explainable trace returned by [`Matcher::evaluate`],
//!   listing every candidate with its [`CandidateVerdict`].
//! - [`Matcher`]: wires the store and inference together.
//!
//! ## Selection
//!
//! Candidates are checked most specific first: more fields before fewer, then
//! by name, then by id. The first full match wins, so the same store and
//! submission always select the same template.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use index::{FieldType, FormStore, IndexKey, Template, TemplateField};
//! use matcher::{FormSubmission, Matcher};
//!
//! let store = Arc::new(FormStore::in_memory());
//! let template = Template::new("Simple Form", vec![TemplateField::new("info", FieldType::Text)]);
//! store
//!     .index()
//!     .build_index(&IndexKey::new("info", FieldType::Text), &template.to_ref())
//!     .unwrap();
//! store.templates().insert(&template).unwrap();
//!
//! let matcher = Matcher::new(store);
//! let mut form = FormSubmission::new();
//! form.insert("info".into(), "anything".into());
//!
//! let result = matcher.match_form(&form).unwrap();
//! assert_eq!(result.template_name(), Some("Simple Form"));
//! ```
//!
//! ## Observability
//!
//! Install a [`MatchMetrics`] implementation via [`set_match_metrics`] to record
//! per-call latency, candidate count and outcome. This is typically done once
//! during service startup.

pub mod engine;
pub mod metrics;
pub mod types;

pub use crate::engine::{check_fields, infer_form, Matcher};
pub use crate::metrics::{set_match_metrics, MatchMetrics};
pub use crate::types::{
    CandidateReport, CandidateVerdict, FormSubmission, InferredForm, MatchError, MatchReport,
    MatchResult,
};
