//! Key-value access to tenant records.
//!
//! Records live under a composite key: partition `TENANT#<sub>`, sort key
//! `PROFILE` or `CONVERSATION#<session>`. Writes are full replacements.

use crate::models::{ConversationKey, ConversationRecord, ProfileRecord};
use async_trait::async_trait;

#[async_trait]
pub trait TenantStore: Send + Sync {
    /// `Ok(None)` when no live record exists. Expired records are never returned.
    async fn load_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<ConversationRecord>, anyhow::Error>;

    /// Overwrite the record for `record.key`.
    async fn save_conversation(&self, record: &ConversationRecord) -> Result<(), anyhow::Error>;

    /// Overwrite the profile for `profile.tenant_id`. No duplicate check.
    async fn save_profile(&self, profile: &ProfileRecord) -> Result<(), anyhow::Error>;

    async fn health_check(&self) -> Result<(), anyhow::Error>;
}
