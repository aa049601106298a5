//! Scores a request against every requested, registered metric.
//!
//! Metric failures never escape `evaluate`: each one becomes a `skipped`
//! entry with its reason, and the remaining metrics still run.

use crate::aggregate::{aggregate, EvaluationResult};
use crate::config::EvaluationConfig;
use crate::error::MetricError;
use crate::registry::{Metric, MetricDescriptor, MetricRegistry};
use crate::request::EvaluationRequest;
use futures_util::future::join_all;
use futures_util::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// Reason recorded for context-dependent metrics when `contexts` is empty.
pub const NO_CONTEXT_REASON: &str = "no context available";

#[derive(Debug, Clone)]
pub struct EvaluationOptions {
    /// Upper bound on each scorer call
    pub metric_timeout: Option<Duration>,
    /// Run scorers interleaved instead of one after another
    pub concurrent: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            metric_timeout: None,
            concurrent: true,
        }
    }
}

impl From<&EvaluationConfig> for EvaluationOptions {
    fn from(config: &EvaluationConfig) -> Self {
        Self {
            metric_timeout: Some(config.metric_timeout()),
            concurrent: config.concurrent,
        }
    }
}

pub struct Evaluator {
    registry: Arc<MetricRegistry>,
    options: EvaluationOptions,
}

impl Evaluator {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self::with_options(registry, EvaluationOptions::default())
    }

    pub fn with_options(registry: Arc<MetricRegistry>, options: EvaluationOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Score `request` and merge the outcomes into a result. Never fails.
    pub async fn evaluate(&self, request: EvaluationRequest) -> EvaluationResult {
        let resolution = self.registry.resolve(request.requested_metrics());

        let mut scores = BTreeMap::new();
        let mut skipped = BTreeMap::new();

        for name in resolution.unresolved {
            log::warn!("Skipping unknown metric '{}'", name);
            let reason = MetricError::Unknown(name.clone()).reason();
            skipped.insert(name, reason);
        }

        let outcomes: Vec<(Metric, Result<f64, MetricError>)> = if self.options.concurrent {
            join_all(
                resolution
                    .resolved
                    .iter()
                    .map(|descriptor| self.score_one(descriptor, &request)),
            )
            .await
        } else {
            let mut outcomes = Vec::with_capacity(resolution.resolved.len());
            for descriptor in &resolution.resolved {
                outcomes.push(self.score_one(descriptor, &request).await);
            }
            outcomes
        };

        for (metric, outcome) in outcomes {
            match outcome {
                Ok(score) => {
                    log::debug!("{} = {:.4}", metric, score);
                    scores.insert(metric.name().to_string(), score);
                }
                Err(e) => {
                    log::warn!("Metric '{}' skipped: {}", metric, e);
                    skipped.insert(metric.name().to_string(), e.reason());
                }
            }
        }

        log::info!(
            "Evaluation finished: {} scored, {} skipped",
            scores.len(),
            skipped.len()
        );

        aggregate(request, scores, skipped)
    }

    async fn score_one(
        &self,
        descriptor: &MetricDescriptor,
        request: &EvaluationRequest,
    ) -> (Metric, Result<f64, MetricError>) {
        let metric = descriptor.metric;

        if metric.requires_context() && !request.has_context() {
            return (metric, Err(MetricError::computation(NO_CONTEXT_REASON)));
        }

        // A panicking scorer is that metric's failure, not the evaluation's.
        let call = AssertUnwindSafe(descriptor.scorer.score(request)).catch_unwind();

        let outcome = match self.options.metric_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    return (
                        metric,
                        Err(MetricError::computation(format!(
                            "timed out after {}ms",
                            limit.as_millis()
                        ))),
                    )
                }
            },
            None => call.await,
        };

        let result = match outcome {
            Ok(result) => result.and_then(check_range),
            Err(_) => Err(MetricError::computation("scorer panicked")),
        };

        (metric, result)
    }
}

/// Scores outside `[0, 1]` or non-finite are failures, not clamped.
fn check_range(score: f64) -> Result<f64, MetricError> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(MetricError::computation(format!(
            "score {} outside [0, 1]",
            score
        )))
    }
}
