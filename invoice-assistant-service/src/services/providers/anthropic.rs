//! Anthropic Messages API provider.
//!
//! Turns are sent as `messages` whose content is a list of text blocks, with
//! the system instruction in the top-level `system` field.

use super::{http_client, ChatProvider, ChatRequest, ProviderError, ProviderResponse};
use crate::config::ModelConfig;
use crate::models::Turn;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::time::Duration;

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Option<Duration>,
}

impl AnthropicConfig {
    pub fn from_model_config(config: &ModelConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| ANTHROPIC_API_BASE.to_string()),
            timeout: config.timeout_seconds.map(Duration::from_secs),
        }
    }
}

pub struct AnthropicChatProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicChatProvider {
    pub fn new(config: AnthropicConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Anthropic API key not configured".to_string(),
            ));
        }

        let client = http_client(config.timeout)?;
        Ok(Self { config, client })
    }
}

fn build_request<'a>(model: &'a str, request: &ChatRequest<'a>) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens: request.max_tokens,
        system: request.system,
        messages: request.turns.iter().map(to_message).collect(),
    }
}

fn to_message(turn: &Turn) -> Message<'_> {
    Message {
        role: turn.role.as_str(),
        content: vec![ContentBlock::Text {
            text: turn.content.as_str(),
        }],
    }
}

fn extract_response(api_response: MessagesResponse) -> Result<ProviderResponse, ProviderError> {
    if api_response.stop_reason.as_deref() == Some("refusal") {
        return Err(ProviderError::ContentFiltered);
    }

    let text: String = api_response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(text),
            ResponseBlock::Other => None,
        })
        .collect();

    if text.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    let usage = api_response.usage.unwrap_or_default();

    Ok(ProviderResponse {
        text,
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
    })
}

#[async_trait]
impl ChatProvider for AnthropicChatProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<ProviderResponse, ProviderError> {
        let body = build_request(&self.config.model, &request);
        let url = format!("{}/messages", self.config.api_base.trim_end_matches('/'));

        tracing::debug!(
            model = %self.config.model,
            turns = request.turns.len(),
            max_tokens = request.max_tokens,
            "Sending request to Anthropic Messages API"
        );

        let response = self
            .client
            .traced_post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Anthropic API error {}: {}",
                status, error_text
            )));
        }

        let api_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        extract_response(api_response)
    }
}

// ============================================================================
// Messages API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Text { text: &'a str },
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}
