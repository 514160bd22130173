pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use service_core::axum::{
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::from_fn,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use service_core::middleware::{security_headers_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AssistantConfig;
use crate::services::{
    ChatProvider, ConversationService, DraftService, ProfileService, TenantStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AssistantConfig,
    pub store: Arc<dyn TenantStore>,
    pub conversation: ConversationService,
    pub profile: ProfileService,
    pub draft: DraftService,
}

impl AppState {
    /// Wire the services around one store and one model backend.
    pub fn new(
        config: AssistantConfig,
        store: Arc<dyn TenantStore>,
        provider: Arc<dyn ChatProvider>,
    ) -> Self {
        let conversation = ConversationService::new(
            store.clone(),
            provider.clone(),
            config.model.max_tokens,
            &config.conversation,
        );
        let profile = ProfileService::new(store.clone());
        let draft = DraftService::new(provider, config.model.draft_max_tokens);

        Self {
            config,
            store,
            conversation,
            profile,
            draft,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let tenant_routes = Router::new()
        .route("/conversation", post(handlers::conversation))
        .route("/profile", post(handlers::create_profile))
        .route("/invoices/draft", post(handlers::draft_invoice))
        .layer(from_fn(middleware::identity_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .merge(tenant_routes)
        .with_state(state.clone())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Service health check
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status, label) = match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!(error = %e, "Store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        status,
        Json(serde_json::json!({
            "status": label,
            "service": state.config.service_name,
            "version": state.config.service_version,
        })),
    )
}

/// Readiness probe: 200 once the store answers, 503 otherwise. No body.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match state.store.health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
