use thiserror::Error;

/// Main error type for ragjudge
#[derive(Error, Debug)]
pub enum RagjudgeError {
    /// Extraction of the structured request failed
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Language model / embedding transport errors
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Failures turning free text into an `EvaluationRequest`.
///
/// Both variants are fatal to the evaluation: there is no record to score.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The model replied, but the reply does not match the declared schema
    #[error("Malformed extraction output: {0}")]
    MalformedOutput(String),

    /// The model call itself failed or timed out
    #[error("Upstream model failure: {0}")]
    UpstreamFailure(String),
}

/// Per-metric failures. Never fatal; recorded in `EvaluationResult::skipped`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    /// Requested name is not in the registry
    #[error("Unknown metric: {0}")]
    Unknown(String),

    /// Scorer failed, timed out, or lacked the input it needs
    #[error("Metric computation failed: {0}")]
    ComputationFailed(String),
}

impl MetricError {
    pub fn computation(reason: impl Into<String>) -> Self {
        MetricError::ComputationFailed(reason.into())
    }

    /// Text stored in the `skipped` map for this failure.
    pub fn reason(&self) -> String {
        match self {
            MetricError::Unknown(_) => "unknown metric".to_string(),
            MetricError::ComputationFailed(reason) => reason.clone(),
        }
    }
}

/// Errors from the chat-completion and embedding endpoints
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Empty response from model")]
    EmptyResponse,
}

impl LlmError {
    /// Rate limits and server-side errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Api { status, .. } => *status == 429 || (500..=504).contains(status),
            LlmError::Network(_) => true,
            _ => false,
        }
    }
}

impl From<LlmError> for MetricError {
    fn from(err: LlmError) -> Self {
        MetricError::ComputationFailed(err.to_string())
    }
}

/// Convenient Result type using RagjudgeError
pub type Result<T> = std::result::Result<T, RagjudgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_llm() {
        let err: RagjudgeError = LlmError::Network("dns failure".to_string()).into();
        assert!(matches!(err, RagjudgeError::Llm(_)));
        assert!(err.to_string().contains("dns failure"));
    }

    #[test]
    fn test_error_from_extraction() {
        let err: RagjudgeError = ExtractionError::MalformedOutput("not json".to_string()).into();
        assert!(matches!(
            err,
            RagjudgeError::Extraction(ExtractionError::MalformedOutput(_))
        ));
        assert!(err.to_string().contains("not json"));
    }

    #[test]
    fn test_metric_error_reason() {
        assert_eq!(MetricError::Unknown("x".into()).reason(), "unknown metric");
        assert_eq!(
            MetricError::computation("no context available").reason(),
            "no context available"
        );
    }

    #[test]
    fn test_llm_error_retryable() {
        assert!(LlmError::Api { status: 429, body: String::new() }.is_retryable());
        assert!(LlmError::Api { status: 503, body: String::new() }.is_retryable());
        assert!(!LlmError::Api { status: 401, body: String::new() }.is_retryable());
        assert!(!LlmError::Parse("bad".into()).is_retryable());
    }

    #[test]
    fn test_llm_error_into_metric_error() {
        let err: MetricError = LlmError::EmptyResponse.into();
        assert_eq!(err.reason(), "Empty response from model");
    }
}
