//! Configuration loading, validation, and management for Parlor.
//!
//! Loads configuration from `~/.parlor/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use parlor_core::provider::SamplingParams;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.parlor/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling parameters for reply generation
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Rolling context window
    #[serde(default)]
    pub context: ContextConfig,

    /// Few-shot exemplar retrieval
    #[serde(default)]
    pub knn: KnnConfig,

    /// Content filter
    #[serde(default)]
    pub filter: FilterConfig,

    /// Creator persona
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "together".into()
}
fn default_model() -> String {
    "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("sampling", &self.sampling)
            .field("context", &self.context)
            .field("knn", &self.knn)
            .field("filter", &self.filter)
            .field("persona", &self.persona)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,

    #[serde(default = "default_stop")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    0.5
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_top_p() -> f32 {
    0.7
}
fn default_top_k() -> u32 {
    50
}
fn default_repetition_penalty() -> f32 {
    1.2
}
fn default_stop() -> Vec<String> {
    vec![
        "<|eot_id|>".into(),
        "<|eom_id|>".into(),
        "\n\n---\n\n".into(),
        "\n\n---".into(),
        "---".into(),
        "\n---".into(),
    ]
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            repetition_penalty: default_repetition_penalty(),
            stop: default_stop(),
        }
    }
}

impl SamplingConfig {
    /// The request-level sampling parameters.
    pub fn params(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            top_p: Some(self.top_p),
            top_k: Some(self.top_k),
            repetition_penalty: Some(self.repetition_penalty),
            stop: self.stop.clone(),
        }
    }
}

/// Rolling context window settings.
///
/// The defaults are the interactive chat values: every turn is summarized
/// and the active buffer keeps at most `max_messages / 2` turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    #[serde(default = "default_summary_interval")]
    pub summary_interval: usize,

    /// How many summaries are kept before the oldest is evicted
    #[serde(default = "default_max_summaries")]
    pub max_summaries: usize,
}

fn default_max_messages() -> usize {
    5
}
fn default_summary_interval() -> usize {
    1
}
fn default_max_summaries() -> usize {
    100
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            summary_interval: default_summary_interval(),
            max_summaries: default_max_summaries(),
        }
    }
}

/// How example questions are turned into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorizerKind {
    /// Local feature hashing, no network
    Hashing,
    /// The provider's embeddings endpoint
    Provider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnConfig {
    /// Number of exemplars retrieved per turn
    #[serde(default = "default_k")]
    pub k: usize,

    /// Compiled program file
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Training conversations (JSON array)
    #[serde(default = "default_training_data")]
    pub training_data: PathBuf,

    #[serde(default = "default_vectorizer")]
    pub vectorizer: VectorizerKind,

    /// Embedding model, used when `vectorizer = "provider"`
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_k() -> usize {
    7
}
fn default_model_path() -> PathBuf {
    AppConfig::config_dir().join("models").join("knn_model.json")
}
fn default_training_data() -> PathBuf {
    AppConfig::config_dir()
        .join("training_data")
        .join("conversations.json")
}
fn default_vectorizer() -> VectorizerKind {
    VectorizerKind::Hashing
}
fn default_embedding_model() -> String {
    "togethercomputer/m2-bert-80M-8k-retrieval".into()
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            model_path: default_model_path(),
            training_data: default_training_data(),
            vectorizer: default_vectorizer(),
            embedding_model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Replacement for every disallowed term
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Extra off-platform terms on top of the built-in list
    #[serde(default)]
    pub extra_social_terms: Vec<String>,

    /// Extra in-person meeting phrases on top of the built-in list
    #[serde(default)]
    pub extra_meeting_terms: Vec<String>,
}

fn default_placeholder() -> String {
    "[FILTERED]".into()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            extra_social_terms: vec![],
            extra_meeting_terms: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// The platform the creator chats on
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Override the persona instructions entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions_override: Option<String>,
}

fn default_platform() -> String {
    "OnlyFans".into()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            instructions_override: None,
        }
    }
}

impl PersonaConfig {
    /// Persona instructions placed at the top of every reply prompt.
    pub fn instructions(&self) -> String {
        match &self.instructions_override {
            Some(text) => text.clone(),
            None => format!(
                "You are a creator on {platform}, chatting with a fan.\n\
                 You are deciding on what your message should be.",
                platform = self.platform
            ),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.parlor/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `PARLOR_API_KEY` (highest priority)
    /// - `TOGETHER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("PARLOR_API_KEY")
                .ok()
                .or_else(|| std::env::var("TOGETHER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("PARLOR_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("PARLOR_MODEL") {
            config.set_model(model);
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".parlor")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.sampling.temperature) {
            return Err(ConfigError::ValidationError(
                "sampling.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.sampling.top_p <= 0.0 || self.sampling.top_p > 1.0 {
            return Err(ConfigError::ValidationError(
                "sampling.top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if self.context.summary_interval == 0 {
            return Err(ConfigError::ValidationError(
                "context.summary_interval must be at least 1".into(),
            ));
        }

        if self.context.max_summaries == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_summaries must be at least 1".into(),
            ));
        }

        if self.knn.k == 0 {
            return Err(ConfigError::ValidationError("knn.k must be at least 1".into()));
        }

        Ok(())
    }

    /// Model for the default provider: its own `default_model` when set,
    /// otherwise the top-level one.
    pub fn model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.as_deref())
            .unwrap_or(&self.default_model)
    }

    /// Override the model for the default provider.
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.default_model = model.into();
        if let Some(provider) = self.providers.get_mut(&self.default_provider) {
            provider.default_model = None;
        }
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            sampling: SamplingConfig::default(),
            context: ContextConfig::default(),
            knn: KnnConfig::default(),
            filter: FilterConfig::default(),
            persona: PersonaConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
