use super::error::AssistantError;
use super::store::TenantStore;
use crate::models::ProfileRecord;
use std::sync::Arc;

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn TenantStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self { store }
    }

    /// Write the tenant's profile, replacing any existing one.
    pub async fn create_profile(
        &self,
        tenant_id: &str,
        email: &str,
    ) -> Result<ProfileRecord, AssistantError> {
        let profile = ProfileRecord::new(tenant_id, email);
        self.store
            .save_profile(&profile)
            .await
            .map_err(AssistantError::Store)?;

        tracing::info!(tenant_id = %tenant_id, "Profile created");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::MemoryTenantStore;

    #[tokio::test]
    async fn second_call_overwrites_created_at() {
        let store = Arc::new(MemoryTenantStore::new());
        let service = ProfileService::new(store.clone());

        let first = service.create_profile("sub123", "a@b.com").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = service.create_profile("sub123", "a@b.com").await.unwrap();

        let stored = store.load_profile("sub123").await.unwrap().unwrap();
        assert_eq!(stored.created_at, second.created_at);
        assert!(stored.created_at > first.created_at);
        assert_eq!(store.record_count("sub123"), 1);
    }

    #[tokio::test]
    async fn store_failure_is_reported() {
        let store = Arc::new(MemoryTenantStore::new());
        store.set_fail_writes(true);
        let service = ProfileService::new(store);

        assert!(matches!(
            service.create_profile("sub123", "a@b.com").await,
            Err(AssistantError::Store(_))
        ));
    }
}
