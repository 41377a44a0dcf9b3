//! OpenAI-compatible chat completions client.
//!
//! Groq, OpenRouter and the HuggingFace inference router all expose the
//! same `POST {base_url}/chat/completions` endpoint, so one client with
//! per-provider presets covers them.
//! See: <https://platform.openai.com/docs/api-reference/chat/create>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::ReplyGenerator;
use crate::types::ReplyRequest;
use crate::{HuginnError, Result};

/// Groq OpenAI-compatible endpoint.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// OpenRouter endpoint.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// HuggingFace inference router (OpenAI-compatible).
pub const HUGGINGFACE_BASE_URL: &str = "https://router.huggingface.co/v1";

pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_OPENROUTER_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";
pub const DEFAULT_HUGGINGFACE_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    name: String,
    api_key: String,
    base_url: String,
    default_model: String,
    http: Client,
}

impl ChatCompletionsClient {
    /// Create a client for an arbitrary compatible endpoint.
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            default_model: default_model.into(),
            http: build_http_client(DEFAULT_TIMEOUT),
        }
    }

    /// Groq preset.
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new("groq", api_key, GROQ_BASE_URL, DEFAULT_GROQ_MODEL)
    }

    /// OpenRouter preset.
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new(
            "openrouter",
            api_key,
            OPENROUTER_BASE_URL,
            DEFAULT_OPENROUTER_MODEL,
        )
    }

    /// HuggingFace router preset.
    pub fn huggingface(api_key: impl Into<String>) -> Self {
        Self::new(
            "huggingface",
            api_key,
            HUGGINGFACE_BASE_URL,
            DEFAULT_HUGGINGFACE_MODEL,
        )
    }

    /// Override the base URL (self-hosted proxies, wiremock in tests).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Model used when a request carries no override.
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http = build_http_client(timeout);
        self
    }

    fn model_for<'a>(&'a self, request: &'a ReplyRequest) -> &'a str {
        request.model.as_deref().unwrap_or(&self.default_model)
    }

    /// Map non-success statuses to [`HuginnError`] variants.
    async fn check_status(response: Response, model: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let message = response.text().await.unwrap_or_default();

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => HuginnError::RateLimited { retry_after },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => HuginnError::AuthenticationFailed,
            StatusCode::NOT_FOUND => HuginnError::ModelNotFound(model.to_string()),
            _ => HuginnError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[async_trait]
impl ReplyGenerator for ChatCompletionsClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &ReplyRequest) -> Result<String> {
        if request.prompt.trim().is_empty() {
            return Err(HuginnError::InvalidInput("prompt is empty".to_string()));
        }

        let model = self.model_for(request);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(WireMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = CompletionRequest {
            model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(provider = %self.name, model, "requesting chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response, model).await?;

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(HuginnError::EmptyResponse)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_point_at_provider_endpoints() {
        assert_eq!(ChatCompletionsClient::groq("k").base_url, GROQ_BASE_URL);
        assert_eq!(
            ChatCompletionsClient::openrouter("k").base_url,
            OPENROUTER_BASE_URL
        );
        assert_eq!(
            ChatCompletionsClient::huggingface("k").name(),
            "huggingface"
        );
    }

    #[test]
    fn request_model_overrides_default() {
        let client = ChatCompletionsClient::groq("k");
        let plain = ReplyRequest::new("hi");
        let overridden = ReplyRequest::new("hi").model("mixtral-8x7b");
        assert_eq!(client.model_for(&plain), DEFAULT_GROQ_MODEL);
        assert_eq!(client.model_for(&overridden), "mixtral-8x7b");
    }

    #[test]
    fn request_body_omits_unset_sampling() {
        let body = CompletionRequest {
            model: "m",
            messages: vec![WireMessage {
                role: "user",
                content: "hi",
            }],
            temperature: None,
            max_tokens: Some(64),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_tokens"], 64);
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
