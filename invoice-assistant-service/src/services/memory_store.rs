//! In-process tenant store for tests and local development.
//!
//! Mirrors the MongoDB store's visible behavior: full-record overwrites and
//! expired conversations treated as absent. Expired conversations are dropped
//! when a load finds them. Failure switches let tests drive
//! the read and write error paths.

use super::store::TenantStore;
use crate::models::keys::{partition_key, PROFILE_SORT_KEY};
use crate::models::{ConversationKey, ConversationRecord, ProfileRecord};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum StoredRecord {
    Conversation(ConversationRecord),
    Profile(ProfileRecord),
}

#[derive(Default)]
pub struct MemoryTenantStore {
    records: DashMap<(String, String), StoredRecord>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent load and health check fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent save fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of records for a tenant, expired ones included.
    pub fn record_count(&self, tenant_id: &str) -> usize {
        let pk = partition_key(tenant_id);
        self.records.iter().filter(|e| e.key().0 == pk).count()
    }

    /// Profile stored for a tenant, if any.
    pub async fn load_profile(
        &self,
        tenant_id: &str,
    ) -> Result<Option<ProfileRecord>, anyhow::Error> {
        self.check_read()?;

        let found = self
            .records
            .get(&(partition_key(tenant_id), PROFILE_SORT_KEY.to_string()))
            .and_then(|entry| match entry.value() {
                StoredRecord::Profile(profile) => Some(profile.clone()),
                _ => None,
            });

        Ok(found)
    }

    fn check_read(&self) -> Result<(), anyhow::Error> {
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("Simulated read failure");
        }
        Ok(())
    }

    fn put(&self, pk: String, sk: String, record: StoredRecord) -> Result<(), anyhow::Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("Simulated write failure");
        }
        self.records.insert((pk, sk), record);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn load_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<ConversationRecord>, anyhow::Error> {
        self.check_read()?;

        let now = Utc::now();
        let id = (key.partition_key(), key.sort_key());
        let current = self.records.get(&id).map(|entry| entry.value().clone());

        let found = match current {
            Some(StoredRecord::Conversation(record)) if record.is_expired_at(now) => {
                self.records.remove_if(&id, |_, value| {
                    matches!(value, StoredRecord::Conversation(r) if r.is_expired_at(now))
                });
                None
            }
            Some(StoredRecord::Conversation(record)) => Some(record),
            _ => None,
        };

        Ok(found)
    }

    async fn save_conversation(&self, record: &ConversationRecord) -> Result<(), anyhow::Error> {
        self.put(
            record.key.partition_key(),
            record.key.sort_key(),
            StoredRecord::Conversation(record.clone()),
        )
    }

    async fn save_profile(&self, profile: &ProfileRecord) -> Result<(), anyhow::Error> {
        self.put(
            profile.partition_key(),
            PROFILE_SORT_KEY.to_string(),
            StoredRecord::Profile(profile.clone()),
        )
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.check_read()
    }
}
