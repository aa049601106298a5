//! End-to-end: free text in, scored result out.

use crate::aggregate::EvaluationResult;
use crate::cache::EmbeddingCache;
use crate::config::Config;
use crate::embeddings::OpenAIEmbedder;
use crate::error::{ExtractionError, Result};
use crate::evaluator::{EvaluationOptions, Evaluator};
use crate::extractor::Extractor;
use crate::llm::{ChatClient, Endpoint, LanguageModel};
use crate::registry::MetricRegistry;
use crate::scorers::default_registry;
use std::sync::Arc;

/// Extractor + evaluator. Holds no per-request state, so one instance can
/// serve concurrent callers.
pub struct RagEvaluation {
    extractor: Extractor,
    evaluator: Evaluator,
}

impl RagEvaluation {
    pub fn new(extractor: Extractor, evaluator: Evaluator) -> Self {
        Self {
            extractor,
            evaluator,
        }
    }

    /// Wire the OpenAI / Azure clients and the default metric registry from config
    pub fn from_config(config: &Config, api_key: &str) -> Result<Self> {
        let endpoint = Endpoint::from_config(&config.llm, api_key);

        let model: Arc<dyn LanguageModel> = Arc::new(ChatClient::from_config(&config.llm, api_key)?);

        let cache = if config.embeddings.cache_capacity > 0 {
            Some(Arc::new(EmbeddingCache::new(config.embeddings.cache_capacity)))
        } else {
            None
        };
        let embedder = Arc::new(
            OpenAIEmbedder::new(
                endpoint,
                config.embeddings.deployment.clone(),
                config.llm.timeout(),
            )?
            .with_cache(cache),
        );

        let registry: Arc<MetricRegistry> = Arc::new(default_registry(
            model.clone(),
            embedder,
            config.evaluation.answer_relevancy_questions,
        ));

        let extractor =
            Extractor::new(model).with_timeout(config.evaluation.extraction_timeout());
        let evaluator =
            Evaluator::with_options(registry, EvaluationOptions::from(&config.evaluation));

        Ok(Self::new(extractor, evaluator))
    }

    /// Extract, then score. Only extraction can fail; metric failures land in `skipped`.
    pub async fn evaluate_text(
        &self,
        raw_text: &str,
    ) -> std::result::Result<EvaluationResult, ExtractionError> {
        let request = self.extractor.extract(raw_text).await?;
        Ok(self.evaluator.evaluate(request).await)
    }
}
