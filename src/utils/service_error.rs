// Service error type mapped onto HTTP responses
// One taxonomy for the whole API surface: validation failures are 400s,
// missing resources 404s, idempotent replays succeed as no-ops, and store
// failures surface as 5xx so webhook deliveries retry the whole event.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{
    db::LedgerError,
    services::{AttributionError, CommissionError, EmailError, ReferralCodeError},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already processed")]
    AlreadyProcessed,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("Internal server error")]
    InternalError,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServiceError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            // Idempotent replays are reported as success with no effects
            ServiceError::AlreadyProcessed => {
                let body = Json(json!({
                    "success": true,
                    "message": "Event already processed",
                    "status": StatusCode::OK.as_u16(),
                }));
                return (StatusCode::OK, body).into_response();
            },
            ServiceError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ServiceError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ServiceError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ServiceError::UpstreamFailure(msg) => (StatusCode::BAD_GATEWAY, msg),
            ServiceError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

// Conversion from various error types

impl From<LedgerError> for ServiceError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::AccountNotFound => ServiceError::NotFound("Account not found".to_string()),
            LedgerError::AlreadyProcessed => ServiceError::AlreadyProcessed,
            LedgerError::DuplicateCode(code) => {
                ServiceError::Conflict(format!("Referral code already exists: {}", code))
            },
            LedgerError::DuplicateEmail(email) => {
                ServiceError::Conflict(format!("Account already exists for email: {}", email))
            },
            LedgerError::Database(msg) | LedgerError::Pool(msg) => {
                ServiceError::DatabaseError(msg)
            },
        }
    }
}

impl From<ReferralCodeError> for ServiceError {
    fn from(error: ReferralCodeError) -> Self {
        match error {
            ReferralCodeError::Ledger(e) => e.into(),
            ReferralCodeError::MaxRetriesExceeded(_) => ServiceError::InternalError,
            other => ServiceError::ValidationError(other.to_string()),
        }
    }
}

impl From<AttributionError> for ServiceError {
    fn from(error: AttributionError) -> Self {
        match error {
            AttributionError::AccountNotFound => {
                ServiceError::NotFound("Account not found".to_string())
            },
            AttributionError::Ledger(e) => e.into(),
        }
    }
}

impl From<CommissionError> for ServiceError {
    fn from(error: CommissionError) -> Self {
        match error {
            CommissionError::AccountNotFound => {
                ServiceError::NotFound("Paying account not found".to_string())
            },
            CommissionError::Ledger(e) => e.into(),
        }
    }
}

impl From<EmailError> for ServiceError {
    fn from(error: EmailError) -> Self {
        ServiceError::UpstreamFailure(error.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(error: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(error.to_string())
    }
}
