//! faithfulness: share of the answer's claims that the retrieved contexts support.

use super::{format_contexts, judge};
use crate::error::MetricError;
use crate::llm::LanguageModel;
use crate::registry::MetricScorer;
use crate::request::EvaluationRequest;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

const INSTRUCTION: &str = r#"You check an answer for claims that the context does not support.
Decompose the ANSWER into atomic factual claims. For each claim decide whether it can be directly inferred from the CONTEXT.
Reply with a single JSON object and nothing else:
{"claims": [{"claim": "<claim>", "supported": true}, ...]}"#;

#[derive(Debug, Deserialize)]
struct Verdict {
    claims: Vec<Claim>,
}

#[derive(Debug, Deserialize)]
struct Claim {
    #[allow(dead_code)]
    #[serde(default)]
    claim: String,
    supported: bool,
}

pub struct FaithfulnessScorer {
    model: Arc<dyn LanguageModel>,
}

impl FaithfulnessScorer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl MetricScorer for FaithfulnessScorer {
    async fn score(&self, request: &EvaluationRequest) -> Result<f64, MetricError> {
        let prompt = format!(
            "QUESTION:\n{}\n\nCONTEXT:\n{}\n\nANSWER:\n{}",
            request.question(),
            format_contexts(request.contexts()),
            request.answer()
        );
        let verdict: Verdict = judge(self.model.as_ref(), INSTRUCTION, &prompt).await?;

        if verdict.claims.is_empty() {
            return Err(MetricError::computation("no claims extracted from answer"));
        }

        let supported = verdict.claims.iter().filter(|c| c.supported).count();
        Ok(supported as f64 / verdict.claims.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::test_support::{FailingModel, ScriptedModel};

    fn request() -> EvaluationRequest {
        EvaluationRequest::new(
            "q",
            "Nvidia leads AI. Nvidia makes cars.",
            vec!["Nvidia leads AI.".to_string()],
            None,
            ["faithfulness"],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_half_supported() {
        let model = Arc::new(ScriptedModel::always(
            r#"{"claims":[{"claim":"Nvidia leads AI","supported":true},{"claim":"Nvidia makes cars","supported":false}]}"#,
        ));
        let score = FaithfulnessScorer::new(model).score(&request()).await.unwrap();
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_no_claims() {
        let model = Arc::new(ScriptedModel::always(r#"{"claims":[]}"#));
        let err = FaithfulnessScorer::new(model).score(&request()).await.unwrap_err();
        assert_eq!(err.reason(), "no claims extracted from answer");
    }

    #[tokio::test]
    async fn test_upstream_error_becomes_reason() {
        let model = Arc::new(FailingModel::new(LlmError::Network("connection reset".into())));
        let err = FaithfulnessScorer::new(model).score(&request()).await.unwrap_err();
        assert!(err.reason().contains("connection reset"));
    }
}
