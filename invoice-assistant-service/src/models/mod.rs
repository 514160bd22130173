//! Domain models for the invoice assistant.

pub mod conversation;
pub mod invoice;
pub mod keys;
pub mod profile;

pub use conversation::{ConversationKey, ConversationRecord, Role, Turn};
pub use invoice::{InvoiceDraft, LineItem, QuickInvoice, QuickLineItem};
pub use profile::ProfileRecord;
