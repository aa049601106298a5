//! Free text -> [`EvaluationRequest`] via a language model.
//!
//! The model is asked for a JSON object with a fixed set of keys. Its reply is
//! treated as untrusted text and validated here; nothing downstream sees a
//! record that failed validation.

use crate::error::ExtractionError;
use crate::llm::LanguageModel;
use crate::reply::parse_json_reply;
use crate::request::EvaluationRequest;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Instruction sent with every extraction call.
pub const EXTRACTION_INSTRUCTION: &str = r#"You are an assistant that extracts fields for RAG answer evaluation.
Read the user's text and reply with a single JSON object and nothing else, using exactly these keys:
  "question": string, the question that was asked
  "answer": string, the answer that was generated
  "contexts": array of strings, the retrieved context passages in the order given (empty array if none)
  "ground_truth": string, the reference answer if one is given, otherwise ""
  "metrics": array of strings, the evaluation metrics requested, written in snake_case (e.g. "context_recall", "answer_relevancy", "faithfulness")
Copy text verbatim; do not paraphrase, summarise, or invent values."#;

/// Shape of the model reply. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct ExtractedFields {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    contexts: Vec<String>,
    metrics: Vec<String>,
    #[serde(default)]
    ground_truth: Option<String>,
}

/// Validate a raw model reply into a request.
pub fn parse_extraction(reply: &str) -> Result<EvaluationRequest, ExtractionError> {
    let fields: ExtractedFields =
        parse_json_reply(reply).map_err(ExtractionError::MalformedOutput)?;

    EvaluationRequest::new(
        fields.question.unwrap_or_default(),
        fields.answer.unwrap_or_default(),
        fields.contexts,
        fields.ground_truth,
        fields.metrics,
    )
}

/// Makes exactly one model call per `extract`; never retries.
pub struct Extractor {
    model: Arc<dyn LanguageModel>,
    timeout: Option<Duration>,
}

impl Extractor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            timeout: None,
        }
    }

    /// Bound the model call. Expiry surfaces as `UpstreamFailure`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn extract(&self, raw_text: &str) -> Result<EvaluationRequest, ExtractionError> {
        let call = self.model.complete(EXTRACTION_INSTRUCTION, raw_text);

        let reply = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                ExtractionError::UpstreamFailure(format!(
                    "model call timed out after {}ms",
                    limit.as_millis()
                ))
            })?,
            None => call.await,
        }
        .map_err(|e| ExtractionError::UpstreamFailure(e.to_string()))?;

        log::debug!("Extraction reply: {}", reply);

        let request = parse_extraction(&reply)?;
        log::debug!(
            "Extracted request: {} contexts, metrics {:?}",
            request.contexts().len(),
            request.requested_metrics()
        );
        Ok(request)
    }
}
