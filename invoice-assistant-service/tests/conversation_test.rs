//! Conversation endpoint integration tests.

mod common;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use chrono::{Duration, Utc};
use common::{body_json, body_string, token, TestApp, INVOICE_REPLY};
use invoice_assistant_service::models::{ConversationKey, Role, Turn};
use invoice_assistant_service::services::providers::{
    mock::MockChatProvider, ChatProvider, ChatRequest, ProviderResponse,
};
use invoice_assistant_service::services::{ProviderError, TenantStore};
use std::sync::Arc;
use tokio::sync::Barrier;

async fn stored_history(app: &TestApp, tenant: &str, session: &str) -> Option<Vec<Turn>> {
    app.store
        .load_conversation(&ConversationKey::new(tenant, session))
        .await
        .unwrap()
        .map(|record| record.history)
}

#[tokio::test]
async fn returns_raw_reply_as_json() {
    let (app, _) = TestApp::with_replies([INVOICE_REPLY]);

    let response = app
        .post(
            "/conversation",
            Some(&token("sub123", None)),
            r#"{"message": "Invoice Acme Corp", "session_id": "s1"}"#,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_string(response).await, INVOICE_REPLY);
}

#[tokio::test]
async fn persists_prior_history_plus_two_turns() {
    let (app, provider) = TestApp::with_replies([INVOICE_REPLY, INVOICE_REPLY]);
    let token = token("sub123", None);

    for message in ["Invoice Acme Corp", "Add 2 hours of design at 100"] {
        let response = app
            .post(
                "/conversation",
                Some(&token),
                &serde_json::json!({ "message": message, "session_id": "s1" }).to_string(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let history = stored_history(&app, "sub123", "s1").await.unwrap();
    assert_eq!(
        history,
        vec![
            Turn::user("Invoice Acme Corp"),
            Turn::assistant(INVOICE_REPLY),
            Turn::user("Add 2 hours of design at 100"),
            Turn::assistant(INVOICE_REPLY),
        ]
    );
    assert_eq!(provider.requests()[1].turns, history[..3].to_vec());
}

#[tokio::test]
async fn missing_message_returns_400_without_writing() {
    let (app, provider) = TestApp::with_replies([INVOICE_REPLY]);
    let token = token("sub123", None);

    for body in [r#"{"session_id": "s1"}"#, r#"{"message": ""}"#, ""] {
        let response = app.post("/conversation", Some(&token), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "message not provided");
    }

    assert_eq!(app.store.write_count(), 0);
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn record_expires_a_day_after_the_write() {
    let (app, _) = TestApp::with_replies([INVOICE_REPLY]);

    app.post(
        "/conversation",
        Some(&token("sub123", None)),
        r#"{"message": "hello"}"#,
    )
    .await;

    let record = app
        .store
        .load_conversation(&ConversationKey::new("sub123", "default_session"))
        .await
        .unwrap()
        .unwrap();
    let drift = (record.expires_at - (Utc::now() + Duration::hours(24))).num_seconds().abs();
    assert!(drift <= 5, "expiry off by {drift}s");
}

#[tokio::test]
async fn history_read_failure_starts_fresh() {
    let (app, _) = TestApp::with_replies([INVOICE_REPLY, INVOICE_REPLY]);
    let token = token("sub123", None);
    let body = r#"{"message": "hello", "session_id": "s1"}"#;

    app.post("/conversation", Some(&token), body).await;
    assert_eq!(stored_history(&app, "sub123", "s1").await.unwrap().len(), 2);

    app.store.set_fail_reads(true);
    let response = app.post("/conversation", Some(&token), body).await;
    assert_eq!(response.status(), StatusCode::OK);
    app.store.set_fail_reads(false);

    assert_eq!(stored_history(&app, "sub123", "s1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn sessionless_requests_share_one_history() {
    let (app, _) = TestApp::with_replies([INVOICE_REPLY, INVOICE_REPLY]);
    let token = token("sub123", None);

    app.post("/conversation", Some(&token), r#"{"message": "first"}"#).await;
    app.post("/conversation", Some(&token), r#"{"message": "second"}"#).await;

    let history = stored_history(&app, "sub123", "default_session").await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].content, "first");
    assert_eq!(history[2].content, "second");
}

#[tokio::test]
async fn empty_session_id_does_not_join_the_default_session() {
    let (app, _) = TestApp::with_replies([INVOICE_REPLY, INVOICE_REPLY]);
    let token = token("sub123", None);

    app.post("/conversation", Some(&token), r#"{"message": "a"}"#).await;
    app.post(
        "/conversation",
        Some(&token),
        r#"{"message": "b", "session_id": ""}"#,
    )
    .await;

    let default = stored_history(&app, "sub123", "default_session").await.unwrap();
    assert_eq!(default.len(), 2);
    assert_eq!(default[0].content, "a");

    let empty = stored_history(&app, "sub123", "").await.unwrap();
    assert_eq!(empty.len(), 2);
    assert_eq!(empty[0].content, "b");
    assert_eq!(app.store.record_count("sub123"), 2);
}

#[tokio::test]
async fn tenants_do_not_see_each_other() {
    let (app, provider) = TestApp::with_replies([INVOICE_REPLY, INVOICE_REPLY]);

    app.post("/conversation", Some(&token("alice", None)), r#"{"message": "alice's"}"#)
        .await;
    app.post("/conversation", Some(&token("bob", None)), r#"{"message": "bob's"}"#)
        .await;

    // Bob's model call saw only his own message.
    assert_eq!(provider.requests()[1].turns, vec![Turn::user("bob's")]);
    assert_eq!(app.store.record_count("alice"), 1);
    assert_eq!(app.store.record_count("bob"), 1);
}

#[tokio::test]
async fn model_failure_returns_generic_500_without_writing() {
    let app = TestApp::spawn(Arc::new(MockChatProvider::new(false)));

    let response = app
        .post(
            "/conversation",
            Some(&token("sub123", None)),
            r#"{"message": "hello"}"#,
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Internal server error" })
    );
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn store_write_failure_returns_500() {
    let (app, _) = TestApp::with_replies([INVOICE_REPLY]);
    app.store.set_fail_writes(true);

    let response = app
        .post(
            "/conversation",
            Some(&token("sub123", None)),
            r#"{"message": "hello"}"#,
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn malformed_json_returns_500() {
    let (app, _) = TestApp::with_replies([INVOICE_REPLY]);

    let response = app
        .post("/conversation", Some(&token("sub123", None)), "{\"message\":")
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn missing_identity_returns_500() {
    let (app, _) = TestApp::with_replies([INVOICE_REPLY]);

    let response = app
        .post("/conversation", None, r#"{"message": "hello"}"#)
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .post("/conversation", Some("not-a-jwt"), r#"{"message": "hello"}"#)
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.store.write_count(), 0);
}

/// Holds every call until `parties` calls are in flight.
struct BarrierProvider {
    barrier: Barrier,
}

#[async_trait]
impl ChatProvider for BarrierProvider {
    fn name(&self) -> &'static str {
        "barrier"
    }

    fn model(&self) -> &str {
        "barrier"
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<ProviderResponse, ProviderError> {
        self.barrier.wait().await;
        Ok(ProviderResponse {
            text: format!("reply to {}", request.turns.len()),
            input_tokens: 0,
            output_tokens: 0,
        })
    }
}

#[tokio::test]
async fn concurrent_turns_on_one_session_lose_a_turn_pair() {
    let app = TestApp::spawn(Arc::new(BarrierProvider {
        barrier: Barrier::new(2),
    }));
    let token = token("sub123", None);

    let (first, second) = tokio::join!(
        app.post("/conversation", Some(&token), r#"{"message": "one", "session_id": "s1"}"#),
        app.post("/conversation", Some(&token), r#"{"message": "two", "session_id": "s1"}"#),
    );
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    // Both turns read the same empty history, so the later write replaced
    // the earlier one instead of extending it.
    let history = stored_history(&app, "sub123", "s1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(app.store.write_count(), 2);
}
