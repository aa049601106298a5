//! Language-model capability and the OpenAI / Azure OpenAI transport behind it.

pub mod chat;

pub use chat::ChatClient;

use crate::config::{LlmConfig, LlmProvider};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::RequestBuilder;

/// Text in, text out. The reply is untrusted: callers validate it.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system_instruction: &str, user_text: &str) -> Result<String, LlmError>;
}

/// Where and how to reach an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct Endpoint {
    provider: LlmProvider,
    base_url: String,
    api_version: Option<String>,
    api_key: String,
}

impl Endpoint {
    pub fn new(
        provider: LlmProvider,
        base_url: impl Into<String>,
        api_version: Option<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version,
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &LlmConfig, api_key: impl Into<String>) -> Self {
        Self::new(
            config.provider,
            config.endpoint.clone(),
            config.api_version.clone(),
            api_key,
        )
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Full URL for an operation such as `chat/completions` or `embeddings`.
    ///
    /// Azure routes by deployment in the path; OpenAI takes the model in the body.
    pub fn url(&self, deployment: &str, operation: &str) -> String {
        match self.provider {
            LlmProvider::OpenAI => format!("{}/{}", self.base_url, operation),
            LlmProvider::Azure => format!(
                "{}/openai/deployments/{}/{}?api-version={}",
                self.base_url,
                deployment,
                operation,
                self.api_version.as_deref().unwrap_or_default()
            ),
        }
    }

    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.provider {
            LlmProvider::OpenAI => {
                request.header("Authorization", format!("Bearer {}", self.api_key))
            }
            LlmProvider::Azure => request.header("api-key", &self.api_key),
        }
    }
}
