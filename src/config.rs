use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ragjudge: RagjudgeConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// ragjudge-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RagjudgeConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RagjudgeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Which wire dialect the endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Azure,
}

/// Language model configuration (chat completions)
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Base URL, e.g. `https://api.openai.com/v1` or `https://<resource>.openai.azure.com`
    pub endpoint: String,
    /// Model name (OpenAI) or deployment name (Azure)
    pub deployment: String,
    /// Required for Azure
    #[serde(default)]
    pub api_version: Option<String>,
    pub api_key_env: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_retries: usize,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Embeddings configuration (used by answer_relevancy). Shares the LLM endpoint and key.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_embedding_deployment")]
    pub deployment: String,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            deployment: default_embedding_deployment(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Evaluation tuning
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_extraction_timeout_secs")]
    pub extraction_timeout_secs: u64,
    #[serde(default = "default_metric_timeout_secs")]
    pub metric_timeout_secs: u64,
    #[serde(default = "default_concurrent")]
    pub concurrent: bool,
    #[serde(default = "default_answer_relevancy_questions")]
    pub answer_relevancy_questions: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            extraction_timeout_secs: default_extraction_timeout_secs(),
            metric_timeout_secs: default_metric_timeout_secs(),
            concurrent: default_concurrent(),
            answer_relevancy_questions: default_answer_relevancy_questions(),
        }
    }
}

impl EvaluationConfig {
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn metric_timeout(&self) -> Duration {
        Duration::from_secs(self.metric_timeout_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_embedding_deployment() -> String {
    "text-embedding-3-small".to_string()
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_extraction_timeout_secs() -> u64 {
    60
}

fn default_metric_timeout_secs() -> u64 {
    120
}

fn default_concurrent() -> bool {
    true
}

fn default_answer_relevancy_questions() -> usize {
    3
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in RAGJUDGE_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("RAGJUDGE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::from_toml_str(&config_str)?;

        // Key presence is only checked for file-based loads
        std::env::var(&config.llm.api_key_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your API key.",
                config.llm.api_key_env
            )
        })?;

        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.llm.endpoint.trim().is_empty() {
            anyhow::bail!("llm.endpoint must not be empty");
        }

        if self.llm.deployment.trim().is_empty() {
            anyhow::bail!("llm.deployment must not be empty");
        }

        if self.llm.provider == LlmProvider::Azure && self.llm.api_version.is_none() {
            anyhow::bail!("llm.api_version is required when provider = \"azure\"");
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            anyhow::bail!("llm.temperature must be between 0.0 and 2.0");
        }

        if self.llm.timeout_secs == 0 {
            anyhow::bail!("llm.timeout_secs must be greater than 0");
        }

        if self.evaluation.extraction_timeout_secs == 0 || self.evaluation.metric_timeout_secs == 0 {
            anyhow::bail!("evaluation timeouts must be greater than 0");
        }

        if !(1..=10).contains(&self.evaluation.answer_relevancy_questions) {
            anyhow::bail!("evaluation.answer_relevancy_questions must be between 1 and 10");
        }

        Ok(())
    }

    /// Read the API key named by `llm.api_key_env`
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.llm.api_key_env).with_context(|| {
            format!("Environment variable {} not set", self.llm.api_key_env)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const AZURE_CONFIG: &str = r#"
[ragjudge]
log_level = "debug"

[llm]
provider = "azure"
endpoint = "https://example.openai.azure.com"
deployment = "gpt-35-turbo"
api_version = "2024-06-01"
api_key_env = "RAGJUDGE_TEST_KEY"

[embeddings]
deployment = "text-embedding-ada-002"

[evaluation]
metric_timeout_secs = 30
concurrent = false
"#;

    fn with_config_env(config_path: &std::path::Path, api_key: Option<&str>, f: impl FnOnce()) {
        let original_config = std::env::var("RAGJUDGE_CONFIG").ok();
        std::env::set_var("RAGJUDGE_CONFIG", config_path.to_str().unwrap());
        match api_key {
            Some(k) => std::env::set_var("RAGJUDGE_TEST_KEY", k),
            None => std::env::remove_var("RAGJUDGE_TEST_KEY"),
        }
        f();
        std::env::remove_var("RAGJUDGE_CONFIG");
        std::env::remove_var("RAGJUDGE_TEST_KEY");
        if let Some(val) = original_config {
            std::env::set_var("RAGJUDGE_CONFIG", val);
        }
    }

    #[test]
    fn test_parse_with_defaults() {
        let config = Config::from_toml_str(AZURE_CONFIG).unwrap();
        assert_eq!(config.ragjudge.log_level, "debug");
        assert_eq!(config.llm.provider, LlmProvider::Azure);
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.max_retries, 0);
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.embeddings.deployment, "text-embedding-ada-002");
        assert_eq!(config.embeddings.cache_capacity, 1000);
        assert_eq!(config.evaluation.metric_timeout(), Duration::from_secs(30));
        assert_eq!(config.evaluation.extraction_timeout_secs, 60);
        assert!(!config.evaluation.concurrent);
        assert_eq!(config.evaluation.answer_relevancy_questions, 3);
    }

    #[test]
    fn test_azure_requires_api_version() {
        let toml = AZURE_CONFIG.replace("api_version = \"2024-06-01\"\n", "");
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("api_version"));
    }

    #[test]
    fn test_openai_minimal() {
        let toml = r#"
[llm]
provider = "openai"
endpoint = "https://api.openai.com/v1"
deployment = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"
"#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::OpenAI);
        assert_eq!(config.ragjudge.log_level, "info");
        assert!(config.evaluation.concurrent);
    }

    #[test]
    fn test_rejects_bad_question_count() {
        let toml = AZURE_CONFIG.replace(
            "concurrent = false",
            "concurrent = false\nanswer_relevancy_questions = 0",
        );
        assert!(Config::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let toml = AZURE_CONFIG.replace("provider = \"azure\"", "provider = \"bedrock\"");
        assert!(Config::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_config_load_success() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, AZURE_CONFIG).unwrap();
        with_config_env(&config_path, Some("test-key"), || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.api_key().unwrap(), "test-key");
        });
    }

    #[test]
    fn test_config_missing_api_key() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, AZURE_CONFIG).unwrap();
        with_config_env(&config_path, None, || {
            let config = Config::load();
            assert!(config.is_err(), "Expected missing API key error");
            assert!(config.unwrap_err().to_string().contains("RAGJUDGE_TEST_KEY"));
        });
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let original = std::env::var("RAGJUDGE_CONFIG").ok();
        std::env::set_var("RAGJUDGE_CONFIG", "nonexistent.toml");
        let config = Config::load();
        assert!(config.is_err());
        std::env::remove_var("RAGJUDGE_CONFIG");
        if let Some(v) = original {
            std::env::set_var("RAGJUDGE_CONFIG", v);
        }
    }
}
