//! The hosted-model boundary.
//!
//! Everything the application wants from a language model goes through the
//! [`ChatModel`] trait: one request in, one text response out. The merge
//! pipeline never touches this module; only the personalization and
//! classification flows do.
//!
//! # Architecture
//!
//! - [`ChatModel`]: object-safe trait defining the single seam to any
//!   text-generation backend
//! - [`OpenAiChatClient`]: reqwest-based client for any OpenAI-compatible
//!   `/chat/completions` endpoint
//!
//! # Failure Policy
//!
//! Calls are independent and idempotent with respect to their inputs, and no
//! retry is performed: callers degrade to original content on any failure,
//! so a failed call costs one card's personalization, nothing more. An
//! explicit request timeout (from [`ModelConfig`]) bounds every call; expiry
//! surfaces as an ordinary error.

use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::config::ModelConfig;

/// A single request to the hosted model.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System message establishing the task.
    pub system: String,
    /// User message carrying the content to transform.
    pub user: String,
    /// Ask the backend to return a strict JSON object.
    pub json_object: bool,
    /// Sampling temperature; `None` leaves the backend default.
    pub temperature: Option<f64>,
    /// Completion length cap; `None` leaves the backend default.
    pub max_tokens: Option<u32>,
}

/// The single seam to any hosted text-generation backend.
///
/// Implementors send one request and return the raw text of the first
/// completion choice. Any backend satisfying this contract is substitutable;
/// tests use canned implementations.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Human-readable backend/model name, for logging.
    fn name(&self) -> &str;

    /// Send one request and return the model's text response.
    async fn chat(&self, request: &ChatRequest) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// Client for an OpenAI-compatible chat completions API (Groq, OpenAI,
/// Ollama's compatibility endpoint, and similar).
pub struct OpenAiChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl fmt::Debug for OpenAiChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiChatClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiChatClient {
    /// Build a client from configuration, reading the API key from the
    /// environment variable the config names.
    pub fn from_config(config: &ModelConfig) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            warn!(
                var = %config.api_key_env,
                "API key variable not set; model calls will likely be rejected"
            );
        }
        Self::with_params(
            &config.base_url,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Build a client with explicit parameters.
    pub fn with_params(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        })
    }

    async fn execute(&self, request: &ChatRequest) -> Result<String, Box<dyn Error + Send + Sync>> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
        });
        if request.json_object {
            body["response_format"] = json!({"type": "json_object"});
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let mut http_request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.send().await?.error_for_status()?;
        let completion: ChatCompletion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| "model response contained no choices".into())
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn chat(&self, request: &ChatRequest) -> Result<String, Box<dyn Error + Send + Sync>> {
        let t0 = Instant::now();
        let result = self.execute(request).await;
        let dt = t0.elapsed();

        match &result {
            Ok(_) => info!(elapsed_ms = dt.as_millis() as u64, "chat call succeeded"),
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "chat call failed")
            }
        }
        result
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn request() -> ChatRequest {
        ChatRequest {
            system: "Reframe news with political nuance. Output strict JSON.".to_string(),
            user: "Rewrite this".to_string(),
            json_object: true,
            temperature: Some(0.6),
            max_tokens: Some(150),
        }
    }

    #[tokio::test]
    async fn test_chat_returns_first_choice_content() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "response_format": {"type": "json_object"},
                "temperature": 0.6,
                "max_tokens": 150,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "{\"title\": \"T\"}"}}]}"#,
            )
            .create_async()
            .await;

        let client = OpenAiChatClient::with_params(
            &server.url(),
            "test-model",
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        let content = client.chat(&request()).await.unwrap();
        assert_eq!(content, r#"{"title": "T"}"#);
    }

    #[tokio::test]
    async fn test_chat_surfaces_http_errors() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let client = OpenAiChatClient::with_params(
            &server.url(),
            "test-model",
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(client.chat(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_choice_list() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let client = OpenAiChatClient::with_params(
            &server.url(),
            "test-model",
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(client.chat(&request()).await.is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = OpenAiChatClient::with_params(
            "https://api.example.com/v1",
            "m",
            Some("secret-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("redacted"));
    }
}
