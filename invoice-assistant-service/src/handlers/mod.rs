//! HTTP handlers for invoice-assistant-service.

pub mod conversation;
pub mod draft;
pub mod metrics;
pub mod profile;

pub use conversation::*;
pub use draft::*;
pub use profile::*;

use serde::de::DeserializeOwned;

use crate::services::AssistantError;

/// Decode a JSON body, treating an empty body as `{}`.
pub(crate) fn parse_body<T>(body: &[u8]) -> Result<T, AssistantError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AssistantError::MalformedRequest(e.to_string()))
}
