//! Composite key layout shared by every tenant record.

pub const TENANT_PREFIX: &str = "TENANT#";
pub const CONVERSATION_PREFIX: &str = "CONVERSATION#";
pub const PROFILE_SORT_KEY: &str = "PROFILE";

pub fn partition_key(tenant_id: &str) -> String {
    format!("{}{}", TENANT_PREFIX, tenant_id)
}
