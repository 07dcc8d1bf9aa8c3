// In-memory ledger store
// Used by the test suite and local development without PostgreSQL. Mirrors
// the transactional semantics of the Postgres store: one mutex guard per
// attribution/distribution, same idempotency gates.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    db::ledger::{AttributionWrite, DistributionWrite, LedgerError, LedgerStore},
    models::{
        Account, CommissionPayout, NewAccount, NewReferralEvent, ReferralEvent,
        SubscriptionPlan, SubscriptionStatus,
    },
};

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<Uuid, Account>,
    by_code: HashMap<String, Uuid>,
    processed: HashSet<String>,
    events: Vec<ReferralEvent>,
    payouts: Vec<CommissionPayout>,
}

#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<MemoryState>,
    lookups: AtomicU64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of account lookups performed, for asserting that validation
    /// short-circuits before touching storage
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Insert a ready-made account row, returning it
    pub async fn seed_account(
        &self,
        email: &str,
        full_name: &str,
        referral_code: &str,
        referred_by: Option<&str>,
    ) -> Account {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            credits: 0,
            referral_code: referral_code.to_string(),
            referred_by: referred_by.map(str::to_string),
            referral_count: 0,
            referral_impact: 0,
            total_referral_earnings_cents: 0,
            pending_payout_cents: 0,
            subscription_plan: SubscriptionPlan::Free.as_str().to_string(),
            subscription_status: SubscriptionStatus::None.as_str().to_string(),
            attributed_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.lock().await;
        state
            .by_code
            .insert(account.referral_code.to_ascii_uppercase(), account.id);
        state.accounts.insert(account.id, account.clone());
        account
    }

    pub async fn account(&self, account_id: Uuid) -> Option<Account> {
        self.state.lock().await.accounts.get(&account_id).cloned()
    }

    pub async fn events(&self) -> Vec<ReferralEvent> {
        self.state.lock().await.events.clone()
    }

    pub async fn payouts(&self) -> Vec<CommissionPayout> {
        self.state.lock().await.payouts.clone()
    }
}

fn push_event(state: &mut MemoryState, event: NewReferralEvent) {
    state.events.push(ReferralEvent {
        id: Uuid::new_v4(),
        event_type: event.event_type,
        account_id: event.account_id,
        details: event.details,
        created_at: Utc::now(),
    });
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn get_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, LedgerError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().await.accounts.get(&account_id).cloned())
    }

    async fn get_account_by_code(&self, code: &str) -> Result<Option<Account>, LedgerError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        Ok(state
            .by_code
            .get(&code.to_ascii_uppercase())
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn referral_code_exists(&self, code: &str) -> Result<bool, LedgerError> {
        let state = self.state.lock().await;
        Ok(state.by_code.contains_key(&code.to_ascii_uppercase()))
    }

    async fn create_account(&self, new_account: NewAccount) -> Result<Account, LedgerError> {
        let mut state = self.state.lock().await;

        let code_key = new_account.referral_code.to_ascii_uppercase();
        if state.by_code.contains_key(&code_key) {
            return Err(LedgerError::DuplicateCode(new_account.referral_code));
        }
        if state
            .accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(&new_account.email))
        {
            return Err(LedgerError::DuplicateEmail(new_account.email));
        }

        let now = Utc::now();
        let account = Account {
            id: new_account.id,
            email: new_account.email,
            full_name: new_account.full_name,
            credits: new_account.credits,
            referral_code: new_account.referral_code,
            referred_by: None,
            referral_count: 0,
            referral_impact: 0,
            total_referral_earnings_cents: 0,
            pending_payout_cents: 0,
            subscription_plan: new_account.subscription_plan,
            subscription_status: new_account.subscription_status,
            attributed_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        state.by_code.insert(code_key, account.id);
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn apply_attribution(&self, write: AttributionWrite) -> Result<(), LedgerError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = Utc::now();

        {
            let account = state
                .accounts
                .get_mut(&write.account_id)
                .ok_or(LedgerError::AccountNotFound)?;

            if account.attributed_at.is_some() {
                return Err(LedgerError::AlreadyProcessed);
            }

            account.attributed_at = Some(now);
            account.credits += write.initial_credits;
            account.referred_by = write.referred_by.clone();
            account.updated_at = now;
        }

        if let Some(grant) = &write.referrer {
            let referrer = state.accounts.get_mut(&grant.referrer_id).ok_or_else(|| {
                LedgerError::Database(format!(
                    "Referrer {} disappeared during attribution",
                    grant.referrer_id
                ))
            })?;
            referrer.credits += grant.credits;
            referrer.referral_impact += grant.impact;
            referrer.referral_count += 1;
            referrer.updated_at = now;
        }

        push_event(
            state,
            NewReferralEvent::new(
                crate::models::ReferralEventKind::Attribution,
                write.account_id,
                serde_json::json!({
                    "initial_credits": write.initial_credits,
                    "referred_by": write.referred_by,
                    "referrer_id": write.referrer.as_ref().map(|g| g.referrer_id),
                }),
            ),
        );

        Ok(())
    }

    async fn apply_distribution(&self, write: DistributionWrite) -> Result<(), LedgerError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = Utc::now();

        if let Some(event_id) = &write.event_id {
            if !state.processed.insert(event_id.clone()) {
                return Err(LedgerError::AlreadyProcessed);
            }
        }

        // Validate every beneficiary up front so the whole distribution is
        // all-or-nothing, like the Postgres transaction
        for credit in &write.credits {
            if !state.accounts.contains_key(&credit.beneficiary_id) {
                if let Some(event_id) = &write.event_id {
                    state.processed.remove(event_id);
                }
                return Err(LedgerError::Database(format!(
                    "Beneficiary {} disappeared during distribution",
                    credit.beneficiary_id
                )));
            }
        }

        for credit in &write.credits {
            let beneficiary = state
                .accounts
                .get_mut(&credit.beneficiary_id)
                .expect("beneficiary checked above");
            beneficiary.total_referral_earnings_cents += credit.amount_cents;
            beneficiary.pending_payout_cents += credit.amount_cents;
            beneficiary.updated_at = now;

            state.payouts.push(CommissionPayout {
                id: Uuid::new_v4(),
                event_id: write.event_id.clone(),
                paying_account_id: write.paying_account_id,
                beneficiary_account_id: credit.beneficiary_id,
                level: i32::from(credit.level),
                amount_cents: credit.amount_cents,
                plan: write.plan.as_str().to_string(),
                created_at: now,
            });
        }

        let total_cents: i64 = write.credits.iter().map(|c| c.amount_cents).sum();
        push_event(
            state,
            NewReferralEvent::new(
                crate::models::ReferralEventKind::Distribution,
                write.paying_account_id,
                serde_json::json!({
                    "event_id": write.event_id,
                    "plan": write.plan.as_str(),
                    "is_new_subscription": write.is_new_subscription,
                    "levels": write.credits.len(),
                    "total_cents": total_cents,
                    "credits": write.credits,
                }),
            ),
        );

        Ok(())
    }

    async fn set_subscription(
        &self,
        account_id: Uuid,
        plan: SubscriptionPlan,
        status: SubscriptionStatus,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or(LedgerError::AccountNotFound)?;

        account.subscription_plan = plan.as_str().to_string();
        account.subscription_status = status.as_str().to_string();
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn record_event(&self, event: NewReferralEvent) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        push_event(&mut state, event);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}
