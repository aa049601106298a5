//! Default LLM-judged scorers for the built-in metrics.

pub mod answer_relevancy;
pub mod context_recall;
pub mod faithfulness;

pub use answer_relevancy::AnswerRelevancyScorer;
pub use context_recall::ContextRecallScorer;
pub use faithfulness::FaithfulnessScorer;

use crate::embeddings::Embedder;
use crate::error::MetricError;
use crate::llm::LanguageModel;
use crate::registry::{Metric, MetricRegistry};
use crate::reply::parse_json_reply;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Registry with every built-in metric backed by its default scorer.
pub fn default_registry(
    model: Arc<dyn LanguageModel>,
    embedder: Arc<dyn Embedder>,
    answer_relevancy_questions: usize,
) -> MetricRegistry {
    MetricRegistry::builder()
        .register(
            Metric::ContextRecall,
            Arc::new(ContextRecallScorer::new(model.clone())),
        )
        .register(
            Metric::AnswerRelevancy,
            Arc::new(AnswerRelevancyScorer::new(
                model.clone(),
                embedder,
                answer_relevancy_questions,
            )),
        )
        .register(Metric::Faithfulness, Arc::new(FaithfulnessScorer::new(model)))
        .build()
}

/// Ask the model and parse its JSON verdict; any failure is the metric's failure.
pub(crate) async fn judge<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    instruction: &str,
    prompt: &str,
) -> Result<T, MetricError> {
    let reply = model.complete(instruction, prompt).await?;
    parse_json_reply(&reply).map_err(MetricError::ComputationFailed)
}

/// Numbered passages, one per line, in retrieval order.
pub(crate) fn format_contexts(contexts: &[String]) -> String {
    contexts
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[{}] {}", i + 1, c))
        .collect::<Vec<_>>()
        .join("\n")
}
