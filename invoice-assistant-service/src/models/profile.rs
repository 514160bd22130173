use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::keys::{partition_key, PROFILE_SORT_KEY};

/// Tenant profile written on first login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub tenant_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl ProfileRecord {
    pub fn new(tenant_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }

    pub fn partition_key(&self) -> String {
        partition_key(&self.tenant_id)
    }

    pub fn sort_key(&self) -> &'static str {
        PROFILE_SORT_KEY
    }
}
