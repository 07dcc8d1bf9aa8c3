// HTTP handlers for the Miky backend core
// Referral validation/commissions, collaborator webhooks, API docs

pub mod docs;
pub mod referral;
pub mod webhooks;

use crate::app::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;

/// Standard response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

// Referral routes
pub fn referral_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/validate",
            post(referral::validate_referral_code).get(referral::validate_referral_code_query),
        )
        .route(
            "/commissions",
            get(referral::commission_schedule).post(referral::trigger_distribution),
        )
}

// Webhook routes (HMAC-signed deliveries from the hosted collaborators)
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/account-created", post(webhooks::account_created))
        .route("/subscription", post(webhooks::subscription_event))
}

// Documentation routes
pub fn docs_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(docs::serve_swagger_ui))
        .route("/openapi.json", get(docs::serve_openapi_spec))
}
