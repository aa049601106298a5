use super::Embedder;
use crate::cache::EmbeddingCache;
use crate::error::LlmError;
use crate::llm::Endpoint;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Request structure for the embeddings API
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response structure from the embeddings API
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Individual embedding data in API response
#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI / Azure OpenAI embeddings client
///
/// Texts already in the cache are served locally; the rest go out in one request.
pub struct OpenAIEmbedder {
    client: Client,
    endpoint: Endpoint,
    deployment: String,
    cache: Option<Arc<EmbeddingCache>>,
}

impl OpenAIEmbedder {
    /// Create a new embedder
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Provider, base URL and credentials (shared with the chat client)
    /// * `deployment` - Model name (e.g. "text-embedding-3-small") or Azure deployment
    /// * `timeout` - Per-request HTTP timeout
    pub fn new(
        endpoint: Endpoint,
        deployment: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            deployment: deployment.into(),
            cache: None,
        })
    }

    pub fn with_cache(mut self, cache: Option<Arc<EmbeddingCache>>) -> Self {
        self.cache = cache;
        self
    }

    async fn embed_uncached(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let request = EmbeddingRequest {
            model: &self.deployment,
            input: texts,
        };

        let url = self.endpoint.url(&self.deployment, "embeddings");
        let response = self
            .endpoint
            .authorize(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        if result.data.len() != texts.len() {
            return Err(LlmError::Parse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }

        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let Some(cache) = &self.cache else {
            return self.embed_uncached(texts).await;
        };

        let mut out: Vec<Option<Vec<f32>>> = texts.iter().map(|t| cache.get(t)).collect();
        let missing: Vec<String> = texts
            .iter()
            .zip(out.iter())
            .filter(|(_, hit)| hit.is_none())
            .map(|(t, _)| t.clone())
            .collect();

        log::debug!(
            "Embedding {} texts ({} cached)",
            texts.len(),
            texts.len() - missing.len()
        );

        if !missing.is_empty() {
            let fetched = self.embed_uncached(&missing).await?;
            let mut fetched = missing.into_iter().zip(fetched);
            for slot in out.iter_mut().filter(|s| s.is_none()) {
                if let Some((text, embedding)) = fetched.next() {
                    cache.put(text, embedding.clone());
                    *slot = Some(embedding);
                }
            }
        }

        out.into_iter()
            .map(|e| e.ok_or(LlmError::EmptyResponse))
            .collect()
    }
}
