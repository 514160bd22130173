use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::ProfileCreatedResponse, middleware::TenantIdentity, services::metrics, AppState,
};

/// `POST /profile`
pub async fn create_profile(
    State(state): State<AppState>,
    identity: TenantIdentity,
) -> Result<impl IntoResponse, AppError> {
    let result = match identity.require_email() {
        Ok(email) => state.profile.create_profile(&identity.tenant_id, email).await,
        Err(e) => Err(e),
    };

    let profile = result.map_err(|e| {
        metrics::record_request("profile", e.outcome());
        tracing::error!(tenant_id = %identity.tenant_id, error = %e, "Failed to create profile");
        AppError::from(e)
    })?;

    metrics::record_request("profile", "ok");
    Ok((
        StatusCode::CREATED,
        Json(ProfileCreatedResponse {
            message: "Profile created successfully".to_string(),
            user_id: profile.tenant_id,
        }),
    ))
}
