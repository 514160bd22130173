//! Test helpers: an app wired to the in-memory store and a scripted model.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use invoice_assistant_service::{
    build_router,
    config::{
        AssistantConfig, ConversationConfig, Environment, ModelConfig, ModelProviderKind,
        SecurityConfig, StoreBackend, StoreConfig,
    },
    services::{providers::mock::MockChatProvider, ChatProvider, MemoryTenantStore},
    AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;
use tower::ServiceExt;

pub const INVOICE_REPLY: &str =
    r#"{"clientName":"Acme Corp","dueDate":null,"lineItems":[],"notes":null}"#;

pub fn test_config() -> AssistantConfig {
    AssistantConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Test,
        service_name: "invoice-assistant-service-test".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        store: StoreConfig {
            backend: StoreBackend::Memory,
            mongodb_uri: String::new(),
            mongodb_database: String::new(),
            collection: "tenant_records".to_string(),
        },
        model: ModelConfig {
            provider: ModelProviderKind::Mock,
            model: "mock".to_string(),
            api_key: String::new(),
            api_base: None,
            max_tokens: 2048,
            draft_max_tokens: 1024,
            timeout_seconds: None,
        },
        conversation: ConversationConfig::default(),
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryTenantStore>,
}

impl TestApp {
    pub fn spawn(provider: Arc<dyn ChatProvider>) -> Self {
        let store = Arc::new(MemoryTenantStore::new());
        let state = AppState::new(test_config(), store.clone(), provider);
        Self {
            router: build_router(state),
            store,
        }
    }

    pub fn with_replies<I, S>(replies: I) -> (Self, Arc<MockChatProvider>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Arc::new(MockChatProvider::new(true).with_replies(replies));
        (Self::spawn(provider.clone()), provider)
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        self.router
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, path: &str) -> Response<Body> {
        self.router
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }
}

/// A token as the gateway would forward it. The signing key is irrelevant to
/// the service.
pub fn token(sub: &str, email: Option<&str>) -> String {
    let mut claims = serde_json::json!({ "sub": sub, "token_use": "id" });
    if let Some(email) = email {
        claims["email"] = serde_json::Value::String(email.to_string());
    }
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"gateway-secret"),
    )
    .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
