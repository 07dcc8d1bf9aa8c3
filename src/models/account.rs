// Account ledger row model
// Mirror of the externally-authenticated user, holding the referral ledger
// fields: credits, referral code/link, cumulative earnings, plan/status.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::schema::accounts;

/// Subscription plan tiers that can appear on an account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubscriptionPlan {
    Free,
    Plus,
    Pro,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Plus => "plus",
            SubscriptionPlan::Pro => "pro",
        }
    }

    /// Whether this plan participates in commission payouts
    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionPlan::Free)
    }
}

impl FromStr for SubscriptionPlan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionPlan::Free),
            "plus" => Ok(SubscriptionPlan::Plus),
            "pro" => Ok(SubscriptionPlan::Pro),
            _ => Err(format!("Invalid subscription plan: {}", s)),
        }
    }
}

/// Subscription lifecycle states mirrored from the payment provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubscriptionStatus {
    None,
    Active,
    CancelAtPeriodEnd,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::None => "none",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::CancelAtPeriodEnd => "cancel_at_period_end",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(SubscriptionStatus::None),
            "active" => Ok(SubscriptionStatus::Active),
            "cancel_at_period_end" => Ok(SubscriptionStatus::CancelAtPeriodEnd),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            _ => Err(format!("Invalid subscription status: {}", s)),
        }
    }
}

/// Account database model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub credits: i32,
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub referral_count: i32,
    pub referral_impact: i32,
    pub total_referral_earnings_cents: i64,
    pub pending_payout_cents: i64,
    pub subscription_plan: String,
    pub subscription_status: String,
    pub attributed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New account row for insertion; id comes from the hosted auth service
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub struct NewAccount {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub credits: i32,
    pub referral_code: String,
    pub subscription_plan: String,
    pub subscription_status: String,
}

impl NewAccount {
    pub fn new(id: Uuid, email: String, full_name: String, referral_code: String) -> Self {
        Self {
            id,
            email,
            full_name,
            credits: 0,
            referral_code,
            subscription_plan: SubscriptionPlan::Free.as_str().to_string(),
            subscription_status: SubscriptionStatus::None.as_str().to_string(),
        }
    }
}

impl Account {
    /// Find account by ID
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        account_id: Uuid,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::accounts::dsl::*;

        accounts
            .filter(id.eq(account_id))
            .select(Account::as_select())
            .first::<Account>(conn)
            .await
            .optional()
    }

    /// Find account by referral code (case-insensitive)
    pub async fn find_by_referral_code(
        conn: &mut AsyncPgConnection,
        code: &str,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::accounts::dsl::*;
        use diesel::PgTextExpressionMethods;

        accounts
            .filter(referral_code.ilike(code))
            .select(Account::as_select())
            .first::<Account>(conn)
            .await
            .optional()
    }

    /// Get the account's plan as enum, defaulting to Free on bad data
    pub fn subscription_plan_enum(&self) -> SubscriptionPlan {
        SubscriptionPlan::from_str(&self.subscription_plan).unwrap_or_else(|e| {
            tracing::warn!(
                "Invalid subscription plan '{}' for account {}, defaulting to Free: {}",
                self.subscription_plan,
                self.id,
                e
            );
            SubscriptionPlan::Free
        })
    }

    /// Whether signup attribution already ran for this account
    pub fn is_attributed(&self) -> bool {
        self.attributed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_conversion() {
        assert_eq!(SubscriptionPlan::Free.as_str(), "free");
        assert_eq!(SubscriptionPlan::Plus.as_str(), "plus");
        assert_eq!(SubscriptionPlan::Pro.as_str(), "pro");

        assert_eq!(
            SubscriptionPlan::from_str("plus"),
            Ok(SubscriptionPlan::Plus)
        );
        assert!(SubscriptionPlan::from_str("business").is_err());
    }

    #[test]
    fn test_plan_is_paid() {
        assert!(!SubscriptionPlan::Free.is_paid());
        assert!(SubscriptionPlan::Plus.is_paid());
        assert!(SubscriptionPlan::Pro.is_paid());
    }

    #[test]
    fn test_status_conversion() {
        assert_eq!(
            SubscriptionStatus::from_str("cancel_at_period_end"),
            Ok(SubscriptionStatus::CancelAtPeriodEnd)
        );
        assert_eq!(SubscriptionStatus::None.as_str(), "none");
        assert!(SubscriptionStatus::from_str("paused").is_err());
    }
}
