pub mod conversation;
pub mod database;
pub mod draft;
pub mod error;
pub mod memory_store;
pub mod metrics;
pub mod profile;
pub mod prompts;
pub mod providers;
pub mod store;

pub use conversation::ConversationService;
pub use database::TenantDb;
pub use draft::DraftService;
pub use error::{AssistantError, ErrorKind};
pub use memory_store::MemoryTenantStore;
pub use profile::ProfileService;
pub use providers::{ChatProvider, ProviderError};
pub use store::TenantStore;
