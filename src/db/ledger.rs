// Ledger store contract
// The referral core never issues raw queries; everything it needs from the
// relational store goes through this trait so the engine can run against
// Postgres in production and the in-memory ledger in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Account, NewAccount, NewReferralEvent, SubscriptionPlan, SubscriptionStatus};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Referral code already exists: {0}")]
    DuplicateCode(String),

    #[error("Account already exists for email: {0}")]
    DuplicateEmail(String),

    #[error("Event already processed")]
    AlreadyProcessed,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl From<diesel::result::Error> for LedgerError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => LedgerError::AccountNotFound,
            other => LedgerError::Database(other.to_string()),
        }
    }
}

/// Grant applied to the direct referrer during signup attribution
#[derive(Debug, Clone)]
pub struct ReferrerGrant {
    pub referrer_id: Uuid,
    pub credits: i32,
    pub impact: i32,
}

/// One signup attribution, applied as a single transaction.
/// The write is guarded by `attributed_at IS NULL`; a second application
/// for the same account fails with `AlreadyProcessed`.
#[derive(Debug, Clone)]
pub struct AttributionWrite {
    pub account_id: Uuid,
    pub initial_credits: i32,
    /// Referrer code recorded on the account, already normalized
    pub referred_by: Option<String>,
    pub referrer: Option<ReferrerGrant>,
}

/// One ancestor credit within a distribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommissionCredit {
    pub level: u8,
    pub beneficiary_id: Uuid,
    pub amount_cents: i64,
}

/// One commission distribution, applied as a single transaction.
/// When `event_id` is set, re-applying the same event fails with
/// `AlreadyProcessed` instead of double-crediting.
#[derive(Debug, Clone)]
pub struct DistributionWrite {
    pub event_id: Option<String>,
    pub paying_account_id: Uuid,
    pub plan: SubscriptionPlan,
    pub is_new_subscription: bool,
    pub credits: Vec<CommissionCredit>,
}

/// Profile/ledger store operations the referral core depends on.
/// Balance mutations are expressed as deltas and must be applied as atomic
/// increments at the store level; read-then-write from callers is not an
/// option here.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, LedgerError>;

    /// Case-insensitive referral code lookup; `code` is already trimmed
    async fn get_account_by_code(&self, code: &str) -> Result<Option<Account>, LedgerError>;

    async fn referral_code_exists(&self, code: &str) -> Result<bool, LedgerError>;

    /// Provision the ledger mirror row for an externally-created account
    async fn create_account(&self, new_account: NewAccount) -> Result<Account, LedgerError>;

    /// Apply a signup attribution atomically (see [`AttributionWrite`])
    async fn apply_attribution(&self, write: AttributionWrite) -> Result<(), LedgerError>;

    /// Apply a commission distribution atomically (see [`DistributionWrite`])
    async fn apply_distribution(&self, write: DistributionWrite) -> Result<(), LedgerError>;

    /// Mirror the subscription plan/status from a provider event
    async fn set_subscription(
        &self,
        account_id: Uuid,
        plan: SubscriptionPlan,
        status: SubscriptionStatus,
    ) -> Result<(), LedgerError>;

    /// Append an entry to the referral audit log
    async fn record_event(&self, event: NewReferralEvent) -> Result<(), LedgerError>;

    async fn health_check(&self) -> Result<(), LedgerError>;
}
