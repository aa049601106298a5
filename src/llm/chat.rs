use super::{Endpoint, LanguageModel};
use crate::config::LlmConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request structure for the chat completions API
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response structure from the chat completions API
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Chat completions client for OpenAI and Azure OpenAI
///
/// One HTTP request per `complete` call unless `max_retries` is raised, in which
/// case rate-limit and 5xx responses are retried with exponential backoff.
pub struct ChatClient {
    client: Client,
    endpoint: Endpoint,
    deployment: String,
    temperature: f32,
    max_retries: usize,
}

impl ChatClient {
    /// Create a new chat client
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Provider, base URL and credentials
    /// * `deployment` - Model name (OpenAI) or deployment name (Azure)
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
            temperature: 0.0,
            max_retries: 0,
        })
    }

    pub fn from_config(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self::new(
            Endpoint::from_config(config, api_key),
            config.deployment.clone(),
            config.timeout(),
        )?
        .with_temperature(config.temperature)
        .with_max_retries(config.max_retries))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Single API request, no retry
    async fn complete_once(&self, system_instruction: &str, user_text: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.deployment,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: self.temperature,
        };

        let url = self.endpoint.url(&self.deployment, "chat/completions");
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

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    async fn complete(&self, system_instruction: &str, user_text: &str) -> Result<String, LlmError> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.complete_once(system_instruction, user_text).await {
                Ok(reply) => {
                    log::debug!(
                        "Chat completion took {:?} (attempt {})",
                        start.elapsed(),
                        attempt + 1
                    );
                    return Ok(reply);
                }
                Err(e) if attempt < self.max_retries && e.is_retryable() => {
                    log::warn!("Retry {}/{} after error: {}", attempt + 1, self.max_retries, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2; // Exponential backoff
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
