//! The structured record every metric is scored against.

use crate::error::ExtractionError;
use serde::Serialize;
use std::collections::BTreeSet;

/// A question/answer/contexts triple plus the metrics the user asked for.
///
/// Built once (by the extractor or [`EvaluationRequest::new`]) and never
/// mutated; pipeline stages take it by reference or by value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRequest {
    question: String,
    answer: String,
    contexts: Vec<String>,
    ground_truth: String,
    requested_metrics: BTreeSet<String>,
}

impl EvaluationRequest {
    /// Build a request, rejecting an empty (or whitespace-only) question or answer.
    ///
    /// Strings are trimmed. `ground_truth` of `None` becomes the empty string.
    pub fn new<I, S>(
        question: impl Into<String>,
        answer: impl Into<String>,
        contexts: Vec<String>,
        ground_truth: Option<String>,
        requested_metrics: I,
    ) -> Result<Self, ExtractionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let question = question.into().trim().to_string();
        let answer = answer.into().trim().to_string();
        if question.is_empty() {
            return Err(ExtractionError::MalformedOutput(
                "`question` is missing or empty".to_string(),
            ));
        }
        if answer.is_empty() {
            return Err(ExtractionError::MalformedOutput(
                "`answer` is missing or empty".to_string(),
            ));
        }

        Ok(Self {
            question,
            answer,
            contexts: contexts.into_iter().map(|c| c.trim().to_string()).collect(),
            ground_truth: ground_truth.map(|g| g.trim().to_string()).unwrap_or_default(),
            requested_metrics: requested_metrics
                .into_iter()
                .map(|m| m.into().trim().to_string())
                .collect(),
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Retrieved passages in retrieval order.
    pub fn contexts(&self) -> &[String] {
        &self.contexts
    }

    /// Empty when the user supplied none.
    pub fn ground_truth(&self) -> &str {
        &self.ground_truth
    }

    pub fn requested_metrics(&self) -> &BTreeSet<String> {
        &self.requested_metrics
    }

    pub fn has_context(&self) -> bool {
        self.contexts.iter().any(|c| !c.is_empty())
    }

    pub fn has_ground_truth(&self) -> bool {
        !self.ground_truth.is_empty()
    }
}
