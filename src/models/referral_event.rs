// Append-only referral ledger records: per-level commission payouts, the
// audit/notification log, and the webhook idempotency table.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::schema::{commission_payouts, processed_events, referral_events};

/// One credited ancestor within one distribution
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = commission_payouts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommissionPayout {
    pub id: Uuid,
    pub event_id: Option<String>,
    pub paying_account_id: Uuid,
    pub beneficiary_account_id: Uuid,
    pub level: i32,
    pub amount_cents: i64,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = commission_payouts)]
pub struct NewCommissionPayout {
    pub event_id: Option<String>,
    pub paying_account_id: Uuid,
    pub beneficiary_account_id: Uuid,
    pub level: i32,
    pub amount_cents: i64,
    pub plan: String,
}

/// Kinds of entries in the referral audit log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReferralEventKind {
    AccountProvisioned,
    Attribution,
    Distribution,
    DistributionSkipped,
}

impl ReferralEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralEventKind::AccountProvisioned => "account_provisioned",
            ReferralEventKind::Attribution => "attribution",
            ReferralEventKind::Distribution => "distribution",
            ReferralEventKind::DistributionSkipped => "distribution_skipped",
        }
    }
}

/// Audit log row
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = referral_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReferralEvent {
    pub id: Uuid,
    pub event_type: String,
    pub account_id: Uuid,
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = referral_events)]
pub struct NewReferralEvent {
    pub event_type: String,
    pub account_id: Uuid,
    pub details: JsonValue,
}

impl NewReferralEvent {
    pub fn new(kind: ReferralEventKind, account_id: Uuid, details: JsonValue) -> Self {
        Self {
            event_type: kind.as_str().to_string(),
            account_id,
            details,
        }
    }
}

/// Idempotency marker for externally-delivered events
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = processed_events)]
pub struct NewProcessedEvent {
    pub event_id: String,
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_strings() {
        assert_eq!(ReferralEventKind::Attribution.as_str(), "attribution");
        assert_eq!(ReferralEventKind::Distribution.as_str(), "distribution");
        assert_eq!(
            ReferralEventKind::DistributionSkipped.as_str(),
            "distribution_skipped"
        );
    }
}
