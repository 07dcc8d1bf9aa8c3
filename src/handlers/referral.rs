// Referral API handlers
// Code validation (public) and commission schedule/distribution endpoints

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    handlers::ApiResponse,
    middleware::require_valid_signature,
    models::SubscriptionPlan,
    services::{referral_code::ReferralCodeError, DistributionRequest},
    utils::ServiceError,
};

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ValidateReferralRequest {
    #[validate(length(max = 64, message = "Referral code is too long"))]
    pub referral_code: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateReferralQuery {
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReferrerPreview {
    pub name: String,
    pub plan: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateReferralResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<ReferrerPreview>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CommissionScheduleQuery {
    pub plan: String,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct DistributionApiRequest {
    pub user_id: Uuid,

    #[validate(length(min = 1, max = 50, message = "Invalid subscription plan"))]
    pub subscription_plan: String,

    #[serde(default)]
    pub is_new_subscription: bool,

    /// Optional idempotency key; repeated keys no-op
    #[validate(length(max = 255, message = "Event id is too long"))]
    pub event_id: Option<String>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// POST /referral/validate - Validate a referral code from a request body
pub async fn validate_referral_code(
    State(state): State<AppState>,
    Json(payload): Json<ValidateReferralRequest>,
) -> Response {
    if let Err(e) = payload.validate() {
        return ServiceError::from(e).into_response();
    }

    respond_with_validation(&state, &payload.referral_code).await
}

/// GET /referral/validate?code=... - Read-only form of the same check
pub async fn validate_referral_code_query(
    State(state): State<AppState>,
    Query(query): Query<ValidateReferralQuery>,
) -> Response {
    let Some(code) = query.code else {
        return ServiceError::ValidationError("Missing 'code' query parameter".to_string())
            .into_response();
    };

    respond_with_validation(&state, &code).await
}

async fn respond_with_validation(state: &AppState, raw_code: &str) -> Response {
    match state.referral_codes.validate(raw_code).await {
        Ok(validation) => {
            let referrer = match (&validation.referrer_name, &validation.referrer_plan) {
                (Some(name), Some(plan)) => Some(ReferrerPreview {
                    name: name.clone(),
                    plan: plan.clone(),
                }),
                _ => None,
            };

            (
                StatusCode::OK,
                Json(ValidateReferralResponse {
                    valid: validation.valid,
                    referrer,
                    message: validation.message,
                }),
            )
                .into_response()
        },
        Err(ReferralCodeError::Missing) => {
            ServiceError::ValidationError("Referral code is required".to_string()).into_response()
        },
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// GET /referral/commissions?plan=...&user_id=... - Commission schedule
/// preview; with user_id the response also shows how deep the account's
/// actual referral chain reaches
pub async fn commission_schedule(
    State(state): State<AppState>,
    Query(query): Query<CommissionScheduleQuery>,
) -> Response {
    let plan = match SubscriptionPlan::from_str(&query.plan.trim().to_lowercase()) {
        Ok(plan) => plan,
        Err(e) => return ServiceError::ValidationError(e).into_response(),
    };

    match state.commission_service.preview(plan, query.user_id).await {
        Ok(preview) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(preview),
                message: "Commission schedule".to_string(),
            }),
        )
            .into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// POST /referral/commissions - Trigger a commission distribution.
/// Signed like a webhook; the payment collaborator is the expected caller.
pub async fn trigger_distribution(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = require_valid_signature(&state.config, &headers, &body) {
        return e.into_response();
    }

    let payload: DistributionApiRequest = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            return ServiceError::ValidationError(format!("Invalid JSON body: {}", e))
                .into_response()
        },
    };
    if let Err(e) = payload.validate() {
        return ServiceError::from(e).into_response();
    }

    let request = DistributionRequest {
        paying_account_id: payload.user_id,
        plan: payload.subscription_plan.trim().to_lowercase(),
        is_new_subscription: payload.is_new_subscription,
        event_id: payload.event_id,
    };

    match state.commission_service.distribute(request).await {
        Ok(result) => {
            let message = if result.already_processed {
                "Event already processed".to_string()
            } else if let Some(reason) = &result.skipped_reason {
                format!("Distribution skipped: {}", reason)
            } else {
                format!("Distributed commissions across {} levels", result.applied.len())
            };

            (
                StatusCode::OK,
                Json(ApiResponse {
                    success: true,
                    data: Some(result),
                    message,
                }),
            )
                .into_response()
        },
        Err(e) => ServiceError::from(e).into_response(),
    }
}
