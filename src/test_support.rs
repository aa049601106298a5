//! In-memory doubles for the model, embedder and scorer capabilities.

use crate::embeddings::Embedder;
use crate::error::{LlmError, MetricError};
use crate::llm::LanguageModel;
use crate::registry::MetricScorer;
use crate::request::EvaluationRequest;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = Box<dyn Fn(&str, &str) -> Result<String, LlmError> + Send + Sync>;

/// Replies computed from (system instruction, user text); records every call.
pub struct ScriptedModel {
    respond: Responder,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    pub fn new(
        respond: impl Fn(&str, &str) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_, _| Ok(reply.clone()))
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, system_instruction: &str, user_text: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_instruction.to_string(), user_text.to_string()));
        (self.respond)(system_instruction, user_text)
    }
}

pub struct FailingModel {
    error: LlmError,
    calls: AtomicUsize,
}

impl FailingModel {
    pub fn new(error: LlmError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _: &str, _: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

pub struct SlowModel {
    delay: Duration,
    reply: String,
}

impl SlowModel {
    pub fn new(delay: Duration, reply: &str) -> Self {
        Self {
            delay,
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for SlowModel {
    async fn complete(&self, _: &str, _: &str) -> Result<String, LlmError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}

/// Scorer returning a fixed outcome; clones share the call counter.
#[derive(Clone)]
pub struct FixedScorer {
    outcome: Result<f64, String>,
    calls: Arc<AtomicUsize>,
}

impl FixedScorer {
    pub fn ok(score: f64) -> Self {
        Self {
            outcome: Ok(score),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn err(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricScorer for FixedScorer {
    async fn score(&self, _request: &EvaluationRequest) -> Result<f64, MetricError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map_err(MetricError::ComputationFailed)
    }
}

pub struct SlowScorer {
    delay: Duration,
    score: f64,
}

impl SlowScorer {
    pub fn new(delay: Duration, score: f64) -> Self {
        Self { delay, score }
    }
}

#[async_trait]
impl MetricScorer for SlowScorer {
    async fn score(&self, _request: &EvaluationRequest) -> Result<f64, MetricError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.score)
    }
}

pub struct PanickingScorer;

#[async_trait]
impl MetricScorer for PanickingScorer {
    async fn score(&self, _request: &EvaluationRequest) -> Result<f64, MetricError> {
        panic!("scorer bug");
    }
}

/// Deterministic bag-of-characters embedding: identical texts map to identical vectors.
pub struct HashEmbedder {
    calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0f32; 26];
                for c in t.to_lowercase().chars().filter(|c| c.is_ascii_lowercase()) {
                    v[(c as u8 - b'a') as usize] += 1.0;
                }
                v
            })
            .collect())
    }
}
