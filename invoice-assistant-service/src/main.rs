use invoice_assistant_service::{
    build_router,
    config::{AssistantConfig, StoreBackend},
    services::{metrics, providers, MemoryTenantStore, TenantDb, TenantStore},
    AppState,
};
use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AssistantConfig::load()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    metrics::init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting invoice assistant service"
    );

    let store: Arc<dyn TenantStore> = match config.store.backend {
        StoreBackend::Mongodb => {
            let db = TenantDb::connect(
                &config.store.mongodb_uri,
                &config.store.mongodb_database,
                &config.store.collection,
            )
            .await?;
            db.initialize_indexes().await?;
            tracing::info!("Database initialized successfully");
            Arc::new(db)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; conversations are lost on restart");
            Arc::new(MemoryTenantStore::new())
        }
    };

    let provider = providers::from_config(&config.model)
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
    tracing::info!(
        provider = provider.name(),
        model = %provider.model(),
        "Model provider initialized"
    );

    let state = AppState::new(config.clone(), store, provider);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
