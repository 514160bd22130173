//! MongoDB-backed tenant store.
//!
//! All records share one collection keyed by `(pk, sk)`. Conversation records
//! carry `expiresAt`, which a TTL index uses to delete them.

use super::metrics;
use super::store::TenantStore;
use crate::models::keys::PROFILE_SORT_KEY;
use crate::models::{ConversationKey, ConversationRecord, ProfileRecord, Turn};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime},
    options::{IndexOptions, ReplaceOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct TenantDb {
    db: Database,
    collection: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConversationDocument {
    pk: String,
    sk: String,
    #[serde(default)]
    history: Vec<Turn>,
    #[serde(rename = "updatedAt", with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
    #[serde(rename = "expiresAt", with = "chrono_datetime_as_bson_datetime")]
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileDocument {
    pk: String,
    sk: String,
    email: String,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<&ConversationRecord> for ConversationDocument {
    fn from(record: &ConversationRecord) -> Self {
        Self {
            pk: record.key.partition_key(),
            sk: record.key.sort_key(),
            history: record.history.clone(),
            updated_at: record.updated_at,
            expires_at: record.expires_at,
        }
    }
}

impl From<&ProfileRecord> for ProfileDocument {
    fn from(profile: &ProfileRecord) -> Self {
        Self {
            pk: profile.partition_key(),
            sk: PROFILE_SORT_KEY.to_string(),
            email: profile.email.clone(),
            created_at: profile.created_at,
        }
    }
}

/// Map a stored document back to a record, or `None` once it is past due.
/// The TTL monitor runs periodically, so expired documents can still be read.
fn live_record(
    key: &ConversationKey,
    document: ConversationDocument,
    now: DateTime<Utc>,
) -> Option<ConversationRecord> {
    let record = ConversationRecord {
        key: key.clone(),
        history: document.history,
        updated_at: document.updated_at,
        expires_at: document.expires_at,
    };
    (!record.is_expired_at(now)).then_some(record)
}

impl TenantDb {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, anyhow::Error> {
        tracing::info!(database = %database, collection = %collection, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            anyhow::anyhow!("Failed to connect to MongoDB: {}", e)
        })?;

        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self {
            db: client.database(database),
            collection: collection.to_string(),
        })
    }

    pub async fn initialize_indexes(&self) -> Result<(), anyhow::Error> {
        tracing::info!(collection = %self.collection, "Creating MongoDB indexes");

        let key_index = IndexModel::builder()
            .keys(doc! { "pk": 1, "sk": 1 })
            .options(
                IndexOptions::builder()
                    .name("pk_sk_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        // Documents without expiresAt (profiles) are never collected.
        let ttl_index = IndexModel::builder()
            .keys(doc! { "expiresAt": 1 })
            .options(
                IndexOptions::builder()
                    .name("expires_at_ttl_idx".to_string())
                    .expire_after(Duration::from_secs(0))
                    .build(),
            )
            .build();

        let collection = self.db.collection::<mongodb::bson::Document>(&self.collection);
        collection
            .create_indexes([key_index, ttl_index], None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create indexes: {}", e);
                anyhow::anyhow!("Failed to create indexes: {}", e)
            })?;

        tracing::info!("Successfully created MongoDB indexes");
        Ok(())
    }

    fn conversations(&self) -> Collection<ConversationDocument> {
        self.db.collection(&self.collection)
    }

    fn profiles(&self) -> Collection<ProfileDocument> {
        self.db.collection(&self.collection)
    }
}

/// Time a store call and count its failures.
async fn observed<T, F>(operation: &'static str, fut: F) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, mongodb::error::Error>>,
{
    let start = Instant::now();
    let result = fut.await;
    metrics::record_store_operation(operation, start.elapsed().as_secs_f64());

    result.map_err(|e| {
        metrics::record_store_error(operation);
        anyhow::anyhow!("MongoDB {} failed: {}", operation, e)
    })
}

#[async_trait]
impl TenantStore for TenantDb {
    async fn load_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<ConversationRecord>, anyhow::Error> {
        let filter = doc! { "pk": key.partition_key(), "sk": key.sort_key() };
        let found = observed("load_conversation", self.conversations().find_one(filter, None)).await?;

        let now = Utc::now();
        Ok(found.and_then(|document| live_record(key, document, now)))
    }

    async fn save_conversation(&self, record: &ConversationRecord) -> Result<(), anyhow::Error> {
        let document = ConversationDocument::from(record);
        let filter = doc! { "pk": document.pk.as_str(), "sk": document.sk.as_str() };
        let options = ReplaceOptions::builder().upsert(true).build();

        observed(
            "save_conversation",
            self.conversations().replace_one(filter, &document, options),
        )
        .await?;
        Ok(())
    }

    async fn save_profile(&self, profile: &ProfileRecord) -> Result<(), anyhow::Error> {
        let document = ProfileDocument::from(profile);
        let filter = doc! { "pk": document.pk.as_str(), "sk": document.sk.as_str() };
        let options = ReplaceOptions::builder().upsert(true).build();

        observed(
            "save_profile",
            self.profiles().replace_one(filter, &document, options),
        )
        .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.db
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| anyhow::anyhow!("MongoDB health check failed: {}", e))?;
        Ok(())
    }
}
