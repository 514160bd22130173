//! Conversational invoice building.
//!
//! One call is one turn: load the session's history, append the user's
//! message, ask the model for the updated invoice, append its reply and
//! write the whole history back. Nothing is locked between the read and the
//! write, so two concurrent turns on one session can overwrite each other.

use super::error::AssistantError;
use super::metrics;
use super::prompts::CONVERSATION_SYSTEM_PROMPT;
use super::providers::{ChatProvider, ChatRequest};
use super::store::TenantStore;
use crate::config::ConversationConfig;
use crate::dtos::ConversationRequest;
use crate::models::{ConversationKey, ConversationRecord, InvoiceDraft, Turn};
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::time::Instant;
use validator::Validate;

#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn TenantStore>,
    provider: Arc<dyn ChatProvider>,
    max_tokens: u32,
    default_session_id: String,
    ttl: Duration,
}

impl ConversationService {
    pub fn new(
        store: Arc<dyn TenantStore>,
        provider: Arc<dyn ChatProvider>,
        max_tokens: u32,
        config: &ConversationConfig,
    ) -> Self {
        Self {
            store,
            provider,
            max_tokens,
            default_session_id: config.default_session_id.clone(),
            ttl: config.ttl(),
        }
    }

    /// Run one turn and return the model's reply text untouched.
    pub async fn handle_message(
        &self,
        tenant_id: &str,
        request: ConversationRequest,
    ) -> Result<String, AssistantError> {
        request.validate()?;
        let message = request.message.unwrap_or_default();

        let session_id = request
            .session_id
            .unwrap_or_else(|| self.default_session_id.clone());
        let key = ConversationKey::new(tenant_id, session_id);

        let mut history = self.load_history(&key).await;
        history.push(Turn::user(message));

        let reply = self.invoke_model(tenant_id, &history).await?;
        check_reply_shape(&reply);
        history.push(Turn::assistant(reply.clone()));

        let record = ConversationRecord::new(key, history, Utc::now(), self.ttl);
        self.store
            .save_conversation(&record)
            .await
            .map_err(AssistantError::Store)?;

        tracing::info!(
            tenant_id = %tenant_id,
            session_id = %record.key.session_id,
            turns = record.history.len(),
            "Conversation turn saved"
        );

        Ok(reply)
    }

    /// Prior turns for `key`. A failed read is logged and treated as a new
    /// conversation.
    async fn load_history(&self, key: &ConversationKey) -> Vec<Turn> {
        match self.store.load_conversation(key).await {
            Ok(Some(record)) => record.history,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    tenant_id = %key.tenant_id,
                    session_id = %key.session_id,
                    error = %e,
                    "Failed to load conversation history, continuing with empty history"
                );
                metrics::record_history_fallback();
                Vec::new()
            }
        }
    }

    async fn invoke_model(&self, tenant_id: &str, history: &[Turn]) -> Result<String, AssistantError> {
        let request = ChatRequest {
            system: Some(CONVERSATION_SYSTEM_PROMPT),
            max_tokens: self.max_tokens,
            turns: history,
        };

        let start = Instant::now();
        let result = self.provider.complete(request).await;
        metrics::record_model_latency(
            self.provider.name(),
            self.provider.model(),
            start.elapsed().as_secs_f64(),
        );

        let response = result.map_err(|e| {
            metrics::record_model_error(self.provider.name(), e.kind());
            AssistantError::Model(e)
        })?;

        metrics::record_tokens(
            tenant_id,
            self.provider.model(),
            response.input_tokens,
            response.output_tokens,
        );

        Ok(response.text)
    }
}

/// Replies are returned as-is; ones that do not parse as an invoice are only
/// logged and counted.
fn check_reply_shape(reply: &str) {
    if let Err(e) = InvoiceDraft::from_reply(reply) {
        tracing::warn!(error = %e, "Model reply is not a valid invoice object");
        metrics::record_unparseable_reply("conversation");
    }
}
