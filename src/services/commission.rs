// Commission table and network commission distributor
// The table is static per-plan data; the distributor walks up to five levels
// of referrer ancestry and credits each ancestor exactly once per event.

use serde::Serialize;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::{CommissionCredit, DistributionWrite, LedgerError, LedgerStore},
    models::{Account, NewReferralEvent, ReferralEventKind, SubscriptionPlan},
    services::email::EmailService,
    services::referral_code::ReferralCodeService,
    utils::audit::AuditLogger,
};

// =============================================================================
// COMMISSION TABLE
// =============================================================================

/// Commission levels stop here, also the cycle safety net
pub const MAX_COMMISSION_DEPTH: u8 = 5;

/// Per-level payouts in cents, direct referrer first
const PLUS_SCHEDULE: [i64; 5] = [200, 150, 80, 50, 20];
const PRO_SCHEDULE: [i64; 5] = [600, 400, 240, 120, 100];

pub struct CommissionTable;

impl CommissionTable {
    /// Full payout schedule for a plan; plans without commissions get `None`
    pub fn schedule(plan: SubscriptionPlan) -> Option<&'static [i64; 5]> {
        match plan {
            SubscriptionPlan::Free => None,
            SubscriptionPlan::Plus => Some(&PLUS_SCHEDULE),
            SubscriptionPlan::Pro => Some(&PRO_SCHEDULE),
        }
    }

    /// Payout for one level, `None` outside 1..=5 or for plans without
    /// commissions
    pub fn commission_for_level(plan: SubscriptionPlan, level: u8) -> Option<i64> {
        if level < 1 || level > MAX_COMMISSION_DEPTH {
            return None;
        }
        Self::schedule(plan).map(|schedule| schedule[usize::from(level) - 1])
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, Error)]
pub enum CommissionError {
    #[error("Paying account not found")]
    AccountNotFound,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// =============================================================================
// REQUEST/RESULT TYPES
// =============================================================================

#[derive(Debug, Clone)]
pub struct DistributionRequest {
    pub paying_account_id: Uuid,
    /// Raw plan string from the caller; unknown plans skip the distribution
    /// instead of failing the triggering request
    pub plan: String,
    pub is_new_subscription: bool,
    /// Idempotency key, usually the provider's event id
    pub event_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedCommission {
    pub level: u8,
    pub beneficiary_id: Uuid,
    pub beneficiary_name: String,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionResult {
    pub paying_account_id: Uuid,
    pub plan: String,
    pub is_new_subscription: bool,
    pub event_id: Option<String>,
    /// True when the idempotency gate matched a previous delivery
    pub already_processed: bool,
    /// Set when the distribution was skipped (unknown plan, no schedule)
    pub skipped_reason: Option<String>,
    pub applied: Vec<AppliedCommission>,
    pub total_cents: i64,
}

impl DistributionResult {
    fn empty(request: &DistributionRequest, skipped_reason: Option<String>) -> Self {
        Self {
            paying_account_id: request.paying_account_id,
            plan: request.plan.clone(),
            is_new_subscription: request.is_new_subscription,
            event_id: request.event_id.clone(),
            already_processed: false,
            skipped_reason,
            applied: Vec::new(),
            total_cents: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    pub level: u8,
    pub amount_cents: i64,
    /// Present when an ancestor actually exists at this level
    pub beneficiary_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulePreview {
    pub plan: String,
    pub levels: Vec<ScheduleEntry>,
    pub total_cents: i64,
    /// How many levels the account's actual chain reaches, when requested
    pub reachable_levels: Option<u8>,
}

// =============================================================================
// DISTRIBUTOR
// =============================================================================

pub struct CommissionService {
    ledger: Arc<dyn LedgerStore>,
    notifier: Option<Arc<EmailService>>,
}

impl CommissionService {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self {
            ledger,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Option<Arc<EmailService>>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Distribute commissions for a payment event across up to five
    /// ancestor levels. Balance writes are atomic and all-or-nothing; a
    /// repeated event id is a no-op reported as `already_processed`.
    #[instrument(skip(self), fields(account = %request.paying_account_id, plan = %request.plan))]
    pub async fn distribute(
        &self,
        request: DistributionRequest,
    ) -> Result<DistributionResult, CommissionError> {
        let paying = self
            .ledger
            .get_account_by_id(request.paying_account_id)
            .await?
            .ok_or(CommissionError::AccountNotFound)?;

        let plan = match SubscriptionPlan::from_str(&request.plan) {
            Ok(plan) => plan,
            Err(_) => {
                error!(
                    "Unknown subscription plan '{}' for account {}, skipping distribution",
                    request.plan, paying.id
                );
                self.record_skip(&paying, &request, "unknown_plan").await;
                return Ok(DistributionResult::empty(
                    &request,
                    Some("unknown_plan".to_string()),
                ));
            },
        };

        let schedule = match CommissionTable::schedule(plan) {
            Some(schedule) => schedule,
            None => {
                info!(
                    "Plan '{}' earns no commissions, skipping distribution for {}",
                    request.plan, paying.id
                );
                self.record_skip(&paying, &request, "plan_without_schedule")
                    .await;
                return Ok(DistributionResult::empty(
                    &request,
                    Some("plan_without_schedule".to_string()),
                ));
            },
        };

        let ancestors = self.resolve_chain(&paying).await?;
        let applied: Vec<AppliedCommission> = ancestors
            .iter()
            .enumerate()
            .map(|(idx, ancestor)| AppliedCommission {
                level: (idx + 1) as u8,
                beneficiary_id: ancestor.id,
                beneficiary_name: ancestor.full_name.clone(),
                amount_cents: schedule[idx],
            })
            .collect();

        let write = DistributionWrite {
            event_id: request.event_id.clone(),
            paying_account_id: paying.id,
            plan,
            is_new_subscription: request.is_new_subscription,
            credits: applied
                .iter()
                .map(|a| CommissionCredit {
                    level: a.level,
                    beneficiary_id: a.beneficiary_id,
                    amount_cents: a.amount_cents,
                })
                .collect(),
        };

        match self.ledger.apply_distribution(write).await {
            Ok(()) => {},
            Err(LedgerError::AlreadyProcessed) => {
                info!(
                    "Distribution event {:?} already processed, skipping",
                    request.event_id
                );
                let mut result = DistributionResult::empty(&request, None);
                result.already_processed = true;
                return Ok(result);
            },
            Err(e) => return Err(e.into()),
        }

        let total_cents: i64 = applied.iter().map(|a| a.amount_cents).sum();
        AuditLogger::log_distribution(
            paying.id,
            request.event_id.as_deref(),
            &request.plan,
            applied.len(),
            total_cents,
        );
        info!(
            "Distributed {} cents across {} levels for account {}",
            total_cents,
            applied.len(),
            paying.id
        );

        self.notify_beneficiaries(&ancestors, &applied, &request)
            .await;

        Ok(DistributionResult {
            paying_account_id: paying.id,
            plan: request.plan,
            is_new_subscription: request.is_new_subscription,
            event_id: request.event_id,
            already_processed: false,
            skipped_reason: None,
            applied,
            total_cents,
        })
    }

    /// Read-only commission preview: the payout schedule for a plan, and
    /// optionally the levels an account's chain actually reaches
    #[instrument(skip(self))]
    pub async fn preview(
        &self,
        plan: SubscriptionPlan,
        account_id: Option<Uuid>,
    ) -> Result<SchedulePreview, CommissionError> {
        let schedule = CommissionTable::schedule(plan);

        let ancestors = match account_id {
            Some(id) => {
                let account = self
                    .ledger
                    .get_account_by_id(id)
                    .await?
                    .ok_or(CommissionError::AccountNotFound)?;
                Some(self.resolve_chain(&account).await?)
            },
            None => None,
        };

        let levels: Vec<ScheduleEntry> = match schedule {
            Some(schedule) => schedule
                .iter()
                .enumerate()
                .map(|(idx, amount)| ScheduleEntry {
                    level: (idx + 1) as u8,
                    amount_cents: *amount,
                    beneficiary_name: ancestors
                        .as_ref()
                        .and_then(|chain| chain.get(idx))
                        .map(|a| a.full_name.clone()),
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(SchedulePreview {
            plan: plan.as_str().to_string(),
            total_cents: levels.iter().map(|l| l.amount_cents).sum(),
            reachable_levels: ancestors.map(|chain| chain.len() as u8),
            levels,
        })
    }

    /// Walk the `referred_by` chain, direct referrer first. Terminates at a
    /// null link, an unresolvable code, the depth cap, or a repeated account
    /// (cycle); the paying account itself is never part of the result.
    async fn resolve_chain(&self, paying: &Account) -> Result<Vec<Account>, LedgerError> {
        let mut ancestors = Vec::new();
        let mut visited: HashSet<Uuid> = HashSet::from([paying.id]);
        let mut current_code = paying.referred_by.clone();

        while ancestors.len() < usize::from(MAX_COMMISSION_DEPTH) {
            let code = match current_code {
                Some(code) => ReferralCodeService::normalize(&code),
                None => break,
            };

            let ancestor = match self.ledger.get_account_by_code(&code).await? {
                Some(account) => account,
                None => {
                    warn!(
                        "Referral chain broken: code '{}' no longer resolves (from account {})",
                        code, paying.id
                    );
                    break;
                },
            };

            if !visited.insert(ancestor.id) {
                warn!(
                    "Referral cycle detected at account {} while walking chain of {}",
                    ancestor.id, paying.id
                );
                break;
            }

            current_code = ancestor.referred_by.clone();
            ancestors.push(ancestor);
        }

        Ok(ancestors)
    }

    async fn record_skip(&self, paying: &Account, request: &DistributionRequest, reason: &str) {
        let event = NewReferralEvent::new(
            ReferralEventKind::DistributionSkipped,
            paying.id,
            serde_json::json!({
                "event_id": request.event_id,
                "plan": request.plan,
                "reason": reason,
            }),
        );
        if let Err(e) = self.ledger.record_event(event).await {
            warn!("Failed to record skipped distribution: {}", e);
        }
    }

    /// Commission notifications are best-effort: the ledger is already
    /// committed, so failures are logged and never bubble up
    async fn notify_beneficiaries(
        &self,
        ancestors: &[Account],
        applied: &[AppliedCommission],
        request: &DistributionRequest,
    ) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        for (ancestor, commission) in ancestors.iter().zip(applied.iter()) {
            if let Err(e) = notifier
                .send_commission_earned(
                    &ancestor.email,
                    &ancestor.full_name,
                    commission.amount_cents,
                    commission.level,
                    &request.plan,
                    request.is_new_subscription,
                )
                .await
            {
                warn!(
                    "Failed to send commission notification to {}: {}",
                    ancestor.email, e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_sums() {
        assert_eq!(PLUS_SCHEDULE.iter().sum::<i64>(), 500);
        assert_eq!(PRO_SCHEDULE.iter().sum::<i64>(), 1460);
    }

    #[test]
    fn test_commission_for_level() {
        assert_eq!(
            CommissionTable::commission_for_level(SubscriptionPlan::Plus, 1),
            Some(200)
        );
        assert_eq!(
            CommissionTable::commission_for_level(SubscriptionPlan::Pro, 5),
            Some(100)
        );
        assert_eq!(
            CommissionTable::commission_for_level(SubscriptionPlan::Free, 1),
            None
        );
        assert_eq!(
            CommissionTable::commission_for_level(SubscriptionPlan::Plus, 6),
            None
        );
        assert_eq!(
            CommissionTable::commission_for_level(SubscriptionPlan::Plus, 0),
            None
        );
    }

    #[test]
    fn test_schedules_are_descending() {
        for schedule in [&PLUS_SCHEDULE, &PRO_SCHEDULE] {
            for pair in schedule.windows(2) {
                assert!(pair[0] >= pair[1]);
            }
        }
    }
}
