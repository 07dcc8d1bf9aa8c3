// Common test utilities and fixtures
// Shared across all test files: in-memory ledger state, referral chain
// seeding and signed webhook request helpers.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{Method, Request},
    response::Response,
    Router,
};
use miky_backend_core::{
    app::AppState,
    app_config::AppConfig,
    build_router,
    db::MemoryLedger,
    middleware::{sign, SIGNATURE_HEADER},
    models::Account,
};

/// App state over a fresh in-memory ledger, email notifications disabled
pub fn test_state() -> (AppState, Arc<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::new());
    let config = Arc::new(AppConfig::for_tests());
    let state = AppState::build(config, ledger.clone(), None);
    (state, ledger)
}

/// Full router plus handles to the ledger and config behind it
pub fn test_app() -> (Router, Arc<MemoryLedger>, Arc<AppConfig>) {
    let ledger = Arc::new(MemoryLedger::new());
    let config = Arc::new(AppConfig::for_tests());
    let state = AppState::build(config.clone(), ledger.clone(), None);
    (build_router(state), ledger, config)
}

/// Seed a referral chain of `depth` ancestors plus the paying account.
/// Returns `(payer, ancestors)` with ancestors ordered direct referrer
/// first.
pub async fn seed_chain(ledger: &MemoryLedger, depth: usize) -> (Account, Vec<Account>) {
    let mut ancestors: Vec<Account> = Vec::with_capacity(depth);

    // Build from the top of the chain down so each account can point at
    // the one above it
    let mut parent_code: Option<String> = None;
    for level in (1..=depth).rev() {
        let account = ledger
            .seed_account(
                &format!("ancestor{}@example.com", level),
                &format!("Ancestor {}", level),
                &format!("ANC{}CODE", level),
                parent_code.as_deref(),
            )
            .await;
        parent_code = Some(account.referral_code.clone());
        ancestors.push(account);
    }
    ancestors.reverse();

    let payer = ledger
        .seed_account(
            "payer@example.com",
            "Paying User",
            "PAYERCODE",
            parent_code.as_deref(),
        )
        .await;

    (payer, ancestors)
}

/// Build an unsigned JSON request
pub fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builder")
}

/// Build a JSON request signed with the shared webhook secret
pub fn signed_request(
    method: Method,
    uri: &str,
    secret: &str,
    body: &serde_json::Value,
) -> Request<Body> {
    let payload = body.to_string();
    let signature = sign(secret, payload.as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(payload))
        .expect("request builder")
}

/// Collect a response body as JSON
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes: Bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is JSON")
}
