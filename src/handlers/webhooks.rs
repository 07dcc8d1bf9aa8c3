// Webhook handlers for the hosted collaborators
// The auth service delivers account-created events; the payment provider
// delivers subscription lifecycle events. Both are HMAC-signed and
// idempotent, so redeliveries are always safe.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    db::LedgerError,
    handlers::ApiResponse,
    middleware::require_valid_signature,
    models::{
        Account, NewAccount, NewReferralEvent, ReferralEventKind, SubscriptionPlan,
        SubscriptionStatus,
    },
    services::{AttributionRequest, DistributionRequest, DistributionResult},
    utils::{trim_and_validate_field, trim_optional_field, ServiceError},
};

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct AccountCreatedEvent {
    pub account_id: Uuid,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 320, message = "Email must be less than 320 characters"))]
    pub email: String,

    #[validate(length(max = 255, message = "Full name must be less than 255 characters"))]
    pub full_name: Option<String>,

    /// Referral code from signup metadata, possibly absent or invalid
    pub referrer_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccountCreatedResponse {
    pub account_id: Uuid,
    pub referral_code: String,
    pub granted_credits: i32,
    pub referred: bool,
    pub already_attributed: bool,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SubscriptionEvent {
    #[validate(length(min = 1, max = 255, message = "Event id is required"))]
    pub event_id: String,

    pub account_id: Uuid,

    #[validate(length(min = 1, max = 50, message = "Plan is required"))]
    pub plan: String,

    #[validate(length(min = 1, max = 50, message = "Status is required"))]
    pub status: String,

    #[serde(default)]
    pub is_new_subscription: bool,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionEventResponse {
    pub account_id: Uuid,
    pub plan: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<DistributionResult>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// POST /webhooks/account-created - Provision the ledger mirror row for a
/// freshly registered account (assigning its referral code), then run
/// signup attribution
pub async fn account_created(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = require_valid_signature(&state.config, &headers, &body) {
        return e.into_response();
    }

    let event: AccountCreatedEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            return ServiceError::ValidationError(format!("Invalid JSON body: {}", e))
                .into_response()
        },
    };
    if let Err(e) = event.validate() {
        return ServiceError::from(e).into_response();
    }

    let account = match provision_account(&state, &event).await {
        Ok(account) => account,
        Err(e) => return e.into_response(),
    };

    let request = AttributionRequest {
        account_id: account.id,
        referrer_code: trim_optional_field(event.referrer_code.as_ref()),
    };

    match state.attribution_service.attribute(request).await {
        Ok(result) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(AccountCreatedResponse {
                    account_id: account.id,
                    referral_code: account.referral_code,
                    granted_credits: result.granted_credits,
                    referred: result.referred,
                    already_attributed: result.already_attributed,
                }),
                message: if result.already_attributed {
                    "Account already attributed".to_string()
                } else {
                    "Account attributed".to_string()
                },
            }),
        )
            .into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Look up the mirror row, creating it when this is the first delivery.
/// A concurrent delivery can win the insert race; fall back to the lookup.
async fn provision_account(
    state: &AppState,
    event: &AccountCreatedEvent,
) -> Result<Account, ServiceError> {
    if let Some(account) = state.ledger.get_account_by_id(event.account_id).await? {
        return Ok(account);
    }

    let email = trim_and_validate_field(&event.email, true)
        .map_err(ServiceError::ValidationError)?
        .to_lowercase();

    let referral_code = state.referral_codes.generate_unique().await?;
    let new_account = NewAccount::new(
        event.account_id,
        email,
        trim_optional_field(event.full_name.as_ref()).unwrap_or_default(),
        referral_code,
    );

    match state.ledger.create_account(new_account).await {
        Ok(account) => {
            info!(
                "Provisioned ledger account {} with referral code {}",
                account.id, account.referral_code
            );
            let provisioned = NewReferralEvent::new(
                ReferralEventKind::AccountProvisioned,
                account.id,
                serde_json::json!({ "referral_code": account.referral_code }),
            );
            if let Err(e) = state.ledger.record_event(provisioned).await {
                error!("Failed to record provisioning event: {}", e);
            }
            Ok(account)
        },
        Err(LedgerError::DuplicateEmail(_)) | Err(LedgerError::DuplicateCode(_)) => {
            match state.ledger.get_account_by_id(event.account_id).await? {
                Some(account) => Ok(account),
                None => Err(ServiceError::Conflict(
                    "Account provisioning raced another delivery, retry the webhook".to_string(),
                )),
            }
        },
        Err(e) => Err(e.into()),
    }
}

/// POST /webhooks/subscription - Mirror the subscription plan/status and,
/// when a paid subscription becomes active, distribute commissions keyed by
/// the provider event id
pub async fn subscription_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = require_valid_signature(&state.config, &headers, &body) {
        return e.into_response();
    }

    let event: SubscriptionEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            return ServiceError::ValidationError(format!("Invalid JSON body: {}", e))
                .into_response()
        },
    };
    if let Err(e) = event.validate() {
        return ServiceError::from(e).into_response();
    }

    let status = match SubscriptionStatus::from_str(&event.status.trim().to_lowercase()) {
        Ok(status) => status,
        Err(e) => return ServiceError::ValidationError(e).into_response(),
    };

    let plan_str = event.plan.trim().to_lowercase();

    // Unknown plans must not fail the provider's delivery; the mirror is
    // left untouched and the distributor records the skip
    match SubscriptionPlan::from_str(&plan_str) {
        Ok(plan) => {
            if let Err(e) = state.ledger.set_subscription(event.account_id, plan, status).await {
                return ServiceError::from(e).into_response();
            }
        },
        Err(_) => {
            error!(
                "Unknown plan '{}' in subscription event {} for account {}",
                event.plan, event.event_id, event.account_id
            );
        },
    }

    let distribution = if status == SubscriptionStatus::Active {
        let request = DistributionRequest {
            paying_account_id: event.account_id,
            plan: plan_str.clone(),
            is_new_subscription: event.is_new_subscription,
            event_id: Some(event.event_id.clone()),
        };

        // A store failure here returns 5xx so the provider redelivers and
        // the whole distribution retries from level 1
        match state.commission_service.distribute(request).await {
            Ok(result) => Some(result),
            Err(e) => return ServiceError::from(e).into_response(),
        }
    } else {
        None
    };

    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data: Some(SubscriptionEventResponse {
                account_id: event.account_id,
                plan: plan_str,
                status: status.as_str().to_string(),
                distribution,
            }),
            message: "Subscription event processed".to_string(),
        }),
    )
        .into_response()
}
