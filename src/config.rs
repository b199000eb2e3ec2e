//! Runtime configuration loaded from an optional YAML file.
//!
//! Every field has a sensible default so the binary runs with no config file
//! at all. The API key is never stored in the file; the config only names
//! the environment variable that holds it.

use std::error::Error;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub feed: FeedConfig,
}

/// Connection settings for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the hosted API, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Hard timeout applied to every model call.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Feed selection settings for the serve layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Number of cards shown per feed response.
    pub size: usize,
    /// What to do when the preference string matches no articles.
    pub fallback: FallbackPolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            size: 3,
            fallback: FallbackPolicy::Random,
        }
    }
}

/// Behavior when a preference filter matches nothing. This is product
/// policy, configurable rather than baked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Sample random articles instead (the default behavior).
    Random,
    /// Serve an empty feed.
    None,
}

impl AppConfig {
    /// Load configuration from `path`, or defaults when no path is given.
    ///
    /// An unreadable or unparseable file is a hard error; silently falling
    /// back to defaults would mask a misconfigured deployment.
    pub async fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error + Send + Sync>> {
        match path {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path).await?;
                let config: AppConfig = serde_yaml::from_str(&raw)?;
                info!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}
