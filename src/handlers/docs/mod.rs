// API Documentation handlers - modular structure
pub mod health;
pub mod referral;
pub mod schemas;
pub mod swagger_ui;
pub mod webhooks;

use crate::app::AppState;
use crate::app_config::AppConfig;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Serve OpenAPI JSON specification at /v1/docs/openapi.json
pub async fn serve_openapi_spec(State(app_state): State<AppState>) -> Response {
    let spec = build_openapi_spec(app_state.config.as_ref());

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&spec).unwrap_or_default(),
    )
        .into_response()
}

/// Re-export swagger UI handler
pub use swagger_ui::serve_swagger_ui;

/// Build the complete OpenAPI specification
pub fn build_openapi_spec(config: &AppConfig) -> serde_json::Value {
    let api_url = match config.environment {
        crate::app_config::Environment::Production => "https://api.miky.ai/api".to_string(),
        crate::app_config::Environment::Staging => "https://staging.miky.ai/api".to_string(),
        _ => format!("http://localhost:{}/api", config.port),
    };

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Miky Backend API",
            "description": "Referral network and commission engine for the Miky platform",
            "version": "1.0.0",
            "contact": {
                "name": "Miky Development Team",
                "email": "dev@miky.ai"
            }
        },
        "servers": [{
            "url": api_url,
            "description": format!("Current server ({})", config.environment)
        }],
        "tags": [
            {
                "name": "Referral",
                "description": "Referral code validation and commission schedules"
            },
            {
                "name": "Webhooks",
                "description": "Signed deliveries from the auth and payment collaborators"
            },
            {
                "name": "Health",
                "description": "Service health checks"
            }
        ],
        "paths": {
            "/v1/referral/validate": json!({
                "post": referral::validate_endpoint()["post"],
                "get": referral::validate_query_endpoint()["get"]
            }),
            "/v1/referral/commissions": json!({
                "get": referral::commission_schedule_endpoint()["get"],
                "post": referral::trigger_distribution_endpoint()["post"]
            }),
            "/v1/webhooks/account-created": webhooks::account_created_endpoint(),
            "/v1/webhooks/subscription": webhooks::subscription_endpoint(),
            "/v1/health": health::health_endpoint(),
        },
        "components": {
            "schemas": schemas::all_schemas(),
            "securitySchemes": {
                "webhookSignature": {
                    "type": "apiKey",
                    "in": "header",
                    "name": "X-Miky-Signature",
                    "description": "Base64 HMAC-SHA256 of the raw request body with the shared webhook secret"
                }
            }
        }
    })
}
