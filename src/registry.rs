//! Closed catalog of metrics and the scorers registered for them.

use crate::error::MetricError;
use crate::request::EvaluationRequest;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Every metric the system knows. Declaration order is the canonical order
/// used for resolution and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    ContextRecall,
    AnswerRelevancy,
    Faithfulness,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::ContextRecall,
        Metric::AnswerRelevancy,
        Metric::Faithfulness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::ContextRecall => "context_recall",
            Metric::AnswerRelevancy => "answer_relevancy",
            Metric::Faithfulness => "faithfulness",
        }
    }

    /// Metrics that cannot be computed without retrieved passages.
    pub fn requires_context(self) -> bool {
        match self {
            Metric::ContextRecall | Metric::Faithfulness => true,
            Metric::AnswerRelevancy => false,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = MetricError;

    /// Exact, case-sensitive match on the metric name. No aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| MetricError::Unknown(s.to_string()))
    }
}

/// Scoring capability for one metric: request in, score in `[0, 1]` out.
#[async_trait]
pub trait MetricScorer: Send + Sync {
    async fn score(&self, request: &EvaluationRequest) -> Result<f64, MetricError>;
}

/// A registered metric and its scorer.
#[derive(Clone)]
pub struct MetricDescriptor {
    pub metric: Metric,
    pub scorer: Arc<dyn MetricScorer>,
}

impl MetricDescriptor {
    pub fn name(&self) -> &'static str {
        self.metric.name()
    }
}

impl fmt::Debug for MetricDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricDescriptor")
            .field("metric", &self.metric)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`MetricRegistry::resolve`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Registered metrics, in canonical order
    pub resolved: Vec<MetricDescriptor>,
    /// Requested names with no registered scorer
    pub unresolved: BTreeSet<String>,
}

impl Resolution {
    pub fn resolved_names(&self) -> BTreeSet<String> {
        self.resolved.iter().map(|d| d.name().to_string()).collect()
    }
}

/// Read-only map from metric to scorer, built once at startup.
///
/// Shared across in-flight evaluations behind an `Arc`; no interior mutability.
#[derive(Default)]
pub struct MetricRegistry {
    scorers: BTreeMap<Metric, Arc<dyn MetricScorer>>,
}

impl MetricRegistry {
    pub fn builder() -> MetricRegistryBuilder {
        MetricRegistryBuilder::default()
    }

    pub fn get(&self, metric: Metric) -> Option<MetricDescriptor> {
        self.scorers.get(&metric).map(|scorer| MetricDescriptor {
            metric,
            scorer: Arc::clone(scorer),
        })
    }

    /// Registered metrics in canonical order.
    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.scorers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }

    /// Split requested names into registered descriptors and everything else.
    ///
    /// Never fails. Output order follows `Metric` declaration order, not the
    /// order of `names`.
    pub fn resolve(&self, names: &BTreeSet<String>) -> Resolution {
        let mut found = BTreeSet::new();
        let mut unresolved = BTreeSet::new();

        for name in names {
            match name.parse::<Metric>() {
                Ok(metric) if self.scorers.contains_key(&metric) => {
                    found.insert(metric);
                }
                _ => {
                    unresolved.insert(name.clone());
                }
            }
        }

        let resolved = found
            .into_iter()
            .filter_map(|metric| self.get(metric))
            .collect();

        Resolution {
            resolved,
            unresolved,
        }
    }
}

impl fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.scorers.keys()).finish()
    }
}

#[derive(Default)]
pub struct MetricRegistryBuilder {
    scorers: BTreeMap<Metric, Arc<dyn MetricScorer>>,
}

impl MetricRegistryBuilder {
    /// Register (or replace) the scorer for `metric`.
    pub fn register(mut self, metric: Metric, scorer: Arc<dyn MetricScorer>) -> Self {
        self.scorers.insert(metric, scorer);
        self
    }

    pub fn build(self) -> MetricRegistry {
        MetricRegistry {
            scorers: self.scorers,
        }
    }
}
