use axum::{body::Bytes, extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use super::parse_body;
use crate::{dtos::DraftRequest, middleware::TenantIdentity, services::metrics, AppState};

/// `POST /invoices/draft`
pub async fn draft_invoice(
    State(state): State<AppState>,
    identity: TenantIdentity,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let result = match parse_body::<DraftRequest>(&body) {
        Ok(request) => state.draft.draft(&identity.tenant_id, request).await,
        Err(e) => Err(e),
    };

    let invoice = result.map_err(|e| {
        metrics::record_request("draft", e.outcome());
        tracing::warn!(tenant_id = %identity.tenant_id, error = %e, "Invoice draft failed");
        AppError::from(e)
    })?;

    metrics::record_request("draft", "ok");
    Ok(Json(invoice))
}
