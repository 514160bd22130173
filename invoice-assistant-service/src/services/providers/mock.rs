//! Mock provider for tests and offline development.

use super::{ChatProvider, ChatRequest, ProviderError, ProviderResponse};
use crate::models::Turn;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Reply used when no scripted replies are queued.
const DEFAULT_REPLY: &str =
    r#"{"clientName": null, "dueDate": null, "lineItems": [], "notes": null}"#;

/// What the mock was asked, captured for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub system: Option<String>,
    pub max_tokens: u32,
    pub turns: Vec<Turn>,
}

/// Replies from a queue (falling back to an empty invoice), or fails every
/// call when disabled.
pub struct MockChatProvider {
    enabled: bool,
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockChatProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue replies returned in order by subsequent calls.
    pub fn with_replies<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut queue) = self.replies.lock() {
            queue.extend(replies.into_iter().map(Into::into));
        }
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<ProviderResponse, ProviderError> {
        self.requests
            .lock()
            .map_err(|e| ProviderError::ApiError(format!("Mock provider mutex poisoned: {}", e)))?
            .push(RecordedRequest {
                system: request.system.map(str::to_string),
                max_tokens: request.max_tokens,
                turns: request.turns.to_vec(),
            });

        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock chat provider not enabled".to_string(),
            ));
        }

        let text = self
            .replies
            .lock()
            .map_err(|e| ProviderError::ApiError(format!("Mock provider mutex poisoned: {}", e)))?
            .pop_front()
            .unwrap_or_else(|| DEFAULT_REPLY.to_string());

        let input_tokens = request
            .turns
            .iter()
            .map(|t| t.content.len() as u32 / 4)
            .sum();

        Ok(ProviderResponse {
            output_tokens: text.len() as u32 / 4,
            text,
            input_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_queued_replies_then_default() {
        let provider = MockChatProvider::new(true).with_replies(["first"]);
        let turns = vec![Turn::user("hello")];
        let request = ChatRequest {
            system: Some("sys"),
            max_tokens: 10,
            turns: &turns,
        };

        assert_eq!(provider.complete(request).await.unwrap().text, "first");
        assert_eq!(provider.complete(request).await.unwrap().text, DEFAULT_REPLY);

        let recorded = provider.requests();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].system.as_deref(), Some("sys"));
        assert_eq!(recorded[0].turns, turns);
    }

    #[tokio::test]
    async fn disabled_provider_fails() {
        let provider = MockChatProvider::new(false);
        let request = ChatRequest {
            system: None,
            max_tokens: 10,
            turns: &[],
        };

        assert!(matches!(
            provider.complete(request).await,
            Err(ProviderError::NotConfigured(_))
        ));
    }
}
