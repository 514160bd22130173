use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

use super::parse_body;
use crate::{
    dtos::ConversationRequest, middleware::TenantIdentity, services::metrics, AppState,
};

/// `POST /conversation`
///
/// Responds with the model's reply verbatim, labelled as JSON whether or not
/// it parses.
pub async fn conversation(
    State(state): State<AppState>,
    identity: TenantIdentity,
    body: Bytes,
) -> Result<Response, AppError> {
    let result = match parse_body::<ConversationRequest>(&body) {
        Ok(request) => {
            state
                .conversation
                .handle_message(&identity.tenant_id, request)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(reply) => {
            metrics::record_request("conversation", "ok");
            Ok(([(header::CONTENT_TYPE, "application/json")], reply).into_response())
        }
        Err(e) => {
            metrics::record_request("conversation", e.outcome());
            tracing::warn!(tenant_id = %identity.tenant_id, error = %e, "Conversation turn failed");
            Err(e.into())
        }
    }
}
