//! Final result record and the merge that builds it.

use crate::request::EvaluationRequest;
use serde::Serialize;
use std::collections::BTreeMap;

/// The request as extracted, plus what each requested metric produced.
///
/// `scores` and `skipped` are disjoint; together they cover every requested name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    #[serde(flatten)]
    request: EvaluationRequest,
    scores: BTreeMap<String, f64>,
    skipped: BTreeMap<String, String>,
}

impl EvaluationResult {
    pub fn request(&self) -> &EvaluationRequest {
        &self.request
    }

    /// Successfully computed metrics, each in `[0, 1]`.
    pub fn scores(&self) -> &BTreeMap<String, f64> {
        &self.scores
    }

    /// Requested metrics with no score, and why.
    pub fn skipped(&self) -> &BTreeMap<String, String> {
        &self.skipped
    }

    pub fn score(&self, metric: &str) -> Option<f64> {
        self.scores.get(metric).copied()
    }

    pub fn into_parts(
        self,
    ) -> (
        EvaluationRequest,
        BTreeMap<String, f64>,
        BTreeMap<String, String>,
    ) {
        (self.request, self.scores, self.skipped)
    }
}

/// Merge a request with its metric outcomes. Pure: no validation, no I/O.
pub fn aggregate(
    request: EvaluationRequest,
    scores: BTreeMap<String, f64>,
    skipped: BTreeMap<String, String>,
) -> EvaluationResult {
    EvaluationResult {
        request,
        scores,
        skipped,
    }
}
