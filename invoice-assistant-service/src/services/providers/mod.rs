//! Model backend abstractions and implementations.
//!
//! A provider takes a system instruction, a token ceiling and an ordered turn
//! list, and returns one textual reply. Implementations: Gemini, the Anthropic
//! Messages API, and a mock for tests.

pub mod anthropic;
pub mod gemini;
pub mod mock;

use crate::config::{ModelConfig, ModelProviderKind};
use crate::models::Turn;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Response contained no text")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::EmptyResponse => "empty_response",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

/// One model invocation.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system: Option<&'a str>,
    pub max_tokens: u32,
    pub turns: &'a [Turn],
}

/// Reply text plus usage as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A generative-text backend, treated as an opaque synchronous function.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider label used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Model identifier sent to the backend.
    fn model(&self) -> &str;

    async fn complete(&self, request: ChatRequest<'_>) -> Result<ProviderResponse, ProviderError>;
}

/// Build the HTTP client shared by the remote providers.
pub(crate) fn http_client(timeout: Option<Duration>) -> Result<Client, ProviderError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e)))
}

/// Construct the provider selected by configuration.
pub fn from_config(config: &ModelConfig) -> Result<Arc<dyn ChatProvider>, ProviderError> {
    let provider: Arc<dyn ChatProvider> = match config.provider {
        ModelProviderKind::Gemini => Arc::new(gemini::GeminiChatProvider::new(
            gemini::GeminiConfig::from_model_config(config),
        )?),
        ModelProviderKind::Anthropic => Arc::new(anthropic::AnthropicChatProvider::new(
            anthropic::AnthropicConfig::from_model_config(config),
        )?),
        ModelProviderKind::Mock => Arc::new(mock::MockChatProvider::new(true)),
    };

    Ok(provider)
}
