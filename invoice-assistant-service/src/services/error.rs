use super::providers::ProviderError;
use service_core::error::AppError;
use thiserror::Error;
use validator::ValidationErrors;

/// Coarse classification used to pick the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad client input. Reported with its message.
    Validation,
    /// Anything the caller cannot fix. Reported as a generic failure.
    Dependency,
}

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("{0}")]
    Validation(String),

    #[error("Malformed request body: {0}")]
    MalformedRequest(String),

    #[error("Missing identity claim: {0}")]
    MissingClaim(&'static str),

    #[error("Model backend error: {0}")]
    Model(#[from] ProviderError),

    #[error("Model reply did not match the expected schema: {0}")]
    UnparseableReply(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(anyhow::Error),
}

impl AssistantError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssistantError::Validation(_) => ErrorKind::Validation,
            AssistantError::MalformedRequest(_)
            | AssistantError::MissingClaim(_)
            | AssistantError::Model(_)
            | AssistantError::UnparseableReply(_)
            | AssistantError::Store(_) => ErrorKind::Dependency,
        }
    }

    /// Label for the request-outcome metric.
    pub fn outcome(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "client_error",
            ErrorKind::Dependency => "server_error",
        }
    }
}

impl From<ValidationErrors> for AssistantError {
    fn from(errors: ValidationErrors) -> Self {
        // Report the first message only; field order is not significant.
        let message = errors
            .field_errors()
            .into_values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());
        AssistantError::Validation(message)
    }
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        match err.kind() {
            ErrorKind::Validation => AppError::BadRequest(err.to_string()),
            ErrorKind::Dependency => AppError::InternalError(anyhow::Error::new(err)),
        }
    }
}
