//! One-shot invoice extraction from a free-text description. Nothing is
//! stored.

use super::error::AssistantError;
use super::metrics;
use super::prompts::draft_prompt;
use super::providers::{ChatProvider, ChatRequest};
use crate::dtos::DraftRequest;
use crate::models::{QuickInvoice, Turn};
use std::sync::Arc;
use std::time::Instant;
use validator::Validate;

#[derive(Clone)]
pub struct DraftService {
    provider: Arc<dyn ChatProvider>,
    max_tokens: u32,
}

impl DraftService {
    pub fn new(provider: Arc<dyn ChatProvider>, max_tokens: u32) -> Self {
        Self {
            provider,
            max_tokens,
        }
    }

    pub async fn draft(
        &self,
        tenant_id: &str,
        request: DraftRequest,
    ) -> Result<QuickInvoice, AssistantError> {
        request.validate()?;
        let description = request.description.unwrap_or_default();

        let turns = [Turn::user(draft_prompt(&description))];
        let start = Instant::now();
        let result = self
            .provider
            .complete(ChatRequest {
                system: None,
                max_tokens: self.max_tokens,
                turns: &turns,
            })
            .await;
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

        QuickInvoice::from_reply(&response.text).map_err(|e| {
            tracing::warn!(tenant_id = %tenant_id, error = %e, "Draft reply is not valid invoice JSON");
            metrics::record_unparseable_reply("draft");
            AssistantError::UnparseableReply(e)
        })
    }
}
