pub mod aggregate;
pub mod cache;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod evaluator;
pub mod extractor;
pub mod llm;
pub mod pipeline;
pub mod registry;
pub mod reply;
pub mod request;
pub mod scorers;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregate::{aggregate, EvaluationResult};
pub use config::Config;
pub use error::{ExtractionError, LlmError, MetricError, RagjudgeError, Result};
pub use evaluator::{EvaluationOptions, Evaluator};
pub use extractor::Extractor;
pub use pipeline::RagEvaluation;
pub use registry::{Metric, MetricDescriptor, MetricRegistry, MetricScorer, Resolution};
pub use request::EvaluationRequest;
