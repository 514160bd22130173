//! Conversation state persisted per (tenant, session).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::keys::{partition_key, CONVERSATION_PREFIX};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Storage identity of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub tenant_id: String,
    pub session_id: String,
}

impl ConversationKey {
    pub fn new(tenant_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            session_id: session_id.into(),
        }
    }

    /// `TENANT#<sub>`
    pub fn partition_key(&self) -> String {
        partition_key(&self.tenant_id)
    }

    /// `CONVERSATION#<session>`
    pub fn sort_key(&self) -> String {
        format!("{}{}", CONVERSATION_PREFIX, self.session_id)
    }
}

/// Full conversation snapshot. Always written as a whole; the store never
/// patches individual turns.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationRecord {
    pub key: ConversationKey,
    pub history: Vec<Turn>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ConversationRecord {
    /// Snapshot `history` as of `now`, expiring `ttl` later.
    pub fn new(key: ConversationKey, history: Vec<Turn>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            key,
            history,
            updated_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
