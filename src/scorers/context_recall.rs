//! context_recall: share of ground-truth statements supported by the retrieved contexts.

use super::{format_contexts, judge};
use crate::error::MetricError;
use crate::llm::LanguageModel;
use crate::registry::MetricScorer;
use crate::request::EvaluationRequest;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

const INSTRUCTION: &str = r#"You check whether a reference answer is covered by retrieved context.
Split the REFERENCE into its individual factual statements. For each statement decide whether it can be attributed to the CONTEXT.
Reply with a single JSON object and nothing else:
{"classifications": [{"statement": "<statement>", "attributed": true}, ...]}"#;

#[derive(Debug, Deserialize)]
struct Verdict {
    classifications: Vec<Classification>,
}

#[derive(Debug, Deserialize)]
struct Classification {
    #[allow(dead_code)]
    #[serde(default)]
    statement: String,
    attributed: bool,
}

pub struct ContextRecallScorer {
    model: Arc<dyn LanguageModel>,
}

impl ContextRecallScorer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl MetricScorer for ContextRecallScorer {
    async fn score(&self, request: &EvaluationRequest) -> Result<f64, MetricError> {
        if !request.has_ground_truth() {
            return Err(MetricError::computation("no ground truth available"));
        }

        let prompt = format!(
            "QUESTION:\n{}\n\nCONTEXT:\n{}\n\nREFERENCE:\n{}",
            request.question(),
            format_contexts(request.contexts()),
            request.ground_truth()
        );
        let verdict: Verdict = judge(self.model.as_ref(), INSTRUCTION, &prompt).await?;

        if verdict.classifications.is_empty() {
            return Err(MetricError::computation(
                "no statements extracted from ground truth",
            ));
        }

        let attributed = verdict
            .classifications
            .iter()
            .filter(|c| c.attributed)
            .count();
        Ok(attributed as f64 / verdict.classifications.len() as f64)
    }
}
