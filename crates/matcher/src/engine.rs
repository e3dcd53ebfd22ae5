use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use index::{FormStore, IndexKey, Template};
use infer::infer_value;

use crate::metrics::metrics_recorder;
use crate::types::{
    CandidateReport, CandidateVerdict, FormSubmission, InferredForm, MatchError, MatchReport,
    MatchResult,
};


/// Infer a type for every submitted field.
///
/// Never fails; non-string values infer as `text`.
pub fn infer_form(submission: &FormSubmission) -> InferredForm {
    submission
        .iter()
        .map(|(name, value)| (name.clone(), infer_value(value)))
        .collect()
}

/// Check whether `template` is a type-exact sub-schema of `inferred`.
///
/// The size check runs first, then fields are checked in declaration order
/// and the first failing field is reported.
pub fn check_fields(template: &Template, inferred: &InferredForm) -> CandidateVerdict {
    if template.field_count() > inferred.len() {
        return CandidateVerdict::TooManyFields;
    }
    for field in &template.fields {
        match inferred.get(&field.name) {
            None => {
                return CandidateVerdict::MissingField {
                    name: field.name.clone(),
                }
            }
            Some(&got) if got != field.field_type => {
                return CandidateVerdict::TypeMismatch {
                    name: field.name.clone(),
                    expected: field.field_type,
                    inferred: got,
                }
            }
            Some(_) => {}
        }
    }
    CandidateVerdict::Selected
}

/// Most specific template first; ties broken by name, then id.
fn rank(a: &Template, b: &Template) -> Ordering {
    b.field_count()
        .cmp(&a.field_count())
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Selects the template a submission satisfies.
pub struct Matcher {
    store: Arc<FormStore>,
}

impl Matcher {
    pub fn new(store: Arc<FormStore>) -> Self {
        Self { store }
    }

    /// Convenience helper for tests or ephemeral matching.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(FormStore::in_memory()))
    }

    pub fn store(&self) -> &Arc<FormStore> {
        &self.store
    }

    /// Union of templates indexed under any submitted `(field, inferred type)`.
    fn candidates(&self, inferred: &InferredForm) -> Result<Vec<Template>, MatchError> {
        let mut seen = HashSet::new();
        let mut templates = Vec::new();

        for (name, &field_type) in inferred {
            let key = IndexKey::new(name.as_str(), field_type);
            for template_ref in self.store.index().find_templates_by_field(&key)? {
                if !seen.insert(template_ref.id.clone()) {
                    continue;
                }
                match self.store.templates().get(&template_ref.id)? {
                    Some(template) => templates.push(template),
                    None => tracing::debug!(
                        template_id = %template_ref.id,
                        key = %key,
                        "skipping index reference to missing template"
                    ),
                }
            }
        }

        templates.sort_by(rank);
        Ok(templates)
    }

    /// Run a match and return the full trace.
    pub fn evaluate(&self, submission: &FormSubmission) -> Result<MatchReport, MatchError> {
        let start = Instant::now();
        let inferred_form = infer_form(submission);
        let candidates = self.candidates(&inferred_form)?;

        let mut reports = Vec::with_capacity(candidates.len());
        let mut selected = None;
        for template in &candidates {
            let verdict = if selected.is_some() {
                CandidateVerdict::NotEvaluated
            } else {
                check_fields(template, &inferred_form)
            };
            let report = CandidateReport {
                template_id: template.id.clone(),
                template_name: template.name.clone(),
                field_count: template.field_count(),
                verdict,
            };
            if report.verdict == CandidateVerdict::Selected {
                selected = Some(report.clone());
            }
            reports.push(report);
        }

        let latency = start.elapsed();
        tracing::debug!(
            fields = inferred_form.len(),
            candidates = reports.len(),
            matched = selected.is_some(),
            latency_us = latency.as_micros() as u64,
            "evaluated form"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_match(latency, reports.len(), selected.is_some());
        }

        Ok(MatchReport {
            inferred_form,
            candidates: reports,
            selected,
        })
    }

    /// Select the best template for `submission`, or report the inferred form.
    pub fn match_form(&self, submission: &FormSubmission) -> Result<MatchResult, MatchError> {
        Ok(self.evaluate(submission)?.into_result())
    }
}
