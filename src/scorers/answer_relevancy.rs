//! answer_relevancy: how well the answer addresses the question.
//!
//! The model proposes questions the answer would respond to; the score is the
//! mean cosine similarity between their embeddings and the original question's.

use super::judge;
use crate::embeddings::{cosine_similarity, Embedder};
use crate::error::MetricError;
use crate::llm::LanguageModel;
use crate::registry::MetricScorer;
use crate::request::EvaluationRequest;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Verdict {
    questions: Vec<String>,
    #[serde(default)]
    noncommittal: bool,
}

pub struct AnswerRelevancyScorer {
    model: Arc<dyn LanguageModel>,
    embedder: Arc<dyn Embedder>,
    question_count: usize,
}

impl AnswerRelevancyScorer {
    pub fn new(model: Arc<dyn LanguageModel>, embedder: Arc<dyn Embedder>, question_count: usize) -> Self {
        Self {
            model,
            embedder,
            question_count: question_count.max(1),
        }
    }

    fn instruction(&self) -> String {
        format!(
            r#"Given an ANSWER, write {} distinct questions that this answer responds to.
Also decide whether the answer is noncommittal (evasive, vague, or "I don't know").
Reply with a single JSON object and nothing else:
{{"questions": ["<question>", ...], "noncommittal": false}}"#,
            self.question_count
        )
    }
}

#[async_trait]
impl MetricScorer for AnswerRelevancyScorer {
    async fn score(&self, request: &EvaluationRequest) -> Result<f64, MetricError> {
        let prompt = format!("ANSWER:\n{}", request.answer());
        let verdict: Verdict = judge(self.model.as_ref(), &self.instruction(), &prompt).await?;

        if verdict.noncommittal {
            return Ok(0.0);
        }

        let generated: Vec<String> = verdict
            .questions
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
        if generated.is_empty() {
            return Err(MetricError::computation("no questions generated from answer"));
        }

        let mut texts = Vec::with_capacity(generated.len() + 1);
        texts.push(request.question().to_string());
        texts.extend(generated);

        let embeddings = self.embedder.embed(&texts).await?;
        let Some((original, rest)) = embeddings.split_first() else {
            return Err(MetricError::computation("embedding service returned nothing"));
        };
        if rest.len() != texts.len() - 1 {
            return Err(MetricError::computation("embedding count mismatch"));
        }

        let mean = rest
            .iter()
            .map(|e| cosine_similarity(original, e) as f64)
            .sum::<f64>()
            / rest.len() as f64;

        // Anti-correlated questions count as irrelevant, not negative
        Ok(mean.clamp(0.0, 1.0))
    }
}
