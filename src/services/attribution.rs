// Signup attribution resolver
// Decides the initial credit grant for a new account and credits the direct
// referrer. Runs exactly once per account; retried deliveries no-op.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_config::ReferralConfig,
    db::{AttributionWrite, LedgerError, LedgerStore, ReferrerGrant},
    models::Account,
    services::email::EmailService,
    services::referral_code::ReferralCodeService,
    utils::audit::AuditLogger,
};

#[derive(Debug, Error)]
pub enum AttributionError {
    #[error("Account not found")]
    AccountNotFound,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone)]
pub struct AttributionRequest {
    pub account_id: Uuid,
    /// Candidate referrer code from signup metadata, possibly absent
    pub referrer_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributionResult {
    pub account_id: Uuid,
    pub granted_credits: i32,
    /// True when a valid referrer was credited
    pub referred: bool,
    pub referrer_id: Option<Uuid>,
    /// True when attribution had already run and nothing changed
    pub already_attributed: bool,
}

pub struct AttributionService {
    ledger: Arc<dyn LedgerStore>,
    settings: ReferralConfig,
    notifier: Option<Arc<EmailService>>,
}

impl AttributionService {
    pub fn new(ledger: Arc<dyn LedgerStore>, settings: ReferralConfig) -> Self {
        Self {
            ledger,
            settings,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Option<Arc<EmailService>>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Run signup attribution for an account. A missing or invalid referrer
    /// code degrades to the base grant instead of failing the signup.
    #[instrument(skip(self), fields(account = %request.account_id))]
    pub async fn attribute(
        &self,
        request: AttributionRequest,
    ) -> Result<AttributionResult, AttributionError> {
        let account = self
            .ledger
            .get_account_by_id(request.account_id)
            .await?
            .ok_or(AttributionError::AccountNotFound)?;

        if account.is_attributed() {
            info!("Account {} already attributed, skipping", account.id);
            return Ok(AttributionResult {
                account_id: account.id,
                granted_credits: 0,
                referred: false,
                referrer_id: None,
                already_attributed: true,
            });
        }

        let referrer = self.resolve_referrer(&account, request.referrer_code).await?;

        let (initial_credits, referred_by, grant) = match &referrer {
            Some(referrer) => (
                self.settings.referred_signup_credits,
                Some(referrer.referral_code.clone()),
                Some(ReferrerGrant {
                    referrer_id: referrer.id,
                    credits: self.settings.referrer_bonus_credits,
                    impact: self.settings.referrer_impact_points,
                }),
            ),
            None => (self.settings.base_signup_credits, None, None),
        };

        let write = AttributionWrite {
            account_id: account.id,
            initial_credits,
            referred_by: referred_by.clone(),
            referrer: grant,
        };

        match self.ledger.apply_attribution(write).await {
            Ok(()) => {},
            Err(LedgerError::AlreadyProcessed) => {
                // Lost the race against a concurrent delivery; same outcome
                info!("Account {} attributed concurrently, skipping", account.id);
                return Ok(AttributionResult {
                    account_id: account.id,
                    granted_credits: 0,
                    referred: false,
                    referrer_id: None,
                    already_attributed: true,
                });
            },
            Err(LedgerError::AccountNotFound) => return Err(AttributionError::AccountNotFound),
            Err(e) => return Err(e.into()),
        }

        AuditLogger::log_attribution(
            account.id,
            initial_credits,
            referred_by.as_deref(),
            referrer.as_ref().map(|r| r.id),
        );
        info!(
            "Attributed account {}: {} credits, referred={}",
            account.id,
            initial_credits,
            referrer.is_some()
        );

        if let Some(referrer) = &referrer {
            self.notify_referrer(referrer, &account).await;
        }

        Ok(AttributionResult {
            account_id: account.id,
            granted_credits: initial_credits,
            referred: referrer.is_some(),
            referrer_id: referrer.map(|r| r.id),
            already_attributed: false,
        })
    }

    /// Resolve the candidate code to a referrer account, degrading every
    /// failure mode to "no referrer"
    async fn resolve_referrer(
        &self,
        account: &Account,
        referrer_code: Option<String>,
    ) -> Result<Option<Account>, AttributionError> {
        let Some(raw_code) = referrer_code else {
            return Ok(None);
        };

        let code = ReferralCodeService::normalize(&raw_code);
        if ReferralCodeService::check_format(&code).is_err() {
            warn!(
                "Malformed referrer code '{}' on signup of {}, granting base credits",
                raw_code, account.id
            );
            return Ok(None);
        }

        match self.ledger.get_account_by_code(&code).await? {
            Some(referrer) if referrer.id == account.id => {
                warn!(
                    "Account {} tried to refer itself, granting base credits",
                    account.id
                );
                Ok(None)
            },
            Some(referrer) => Ok(Some(referrer)),
            None => {
                warn!(
                    "Referrer code '{}' not found on signup of {}, granting base credits",
                    code, account.id
                );
                Ok(None)
            },
        }
    }

    /// Referral bonus notifications are best-effort after the grant commits
    async fn notify_referrer(&self, referrer: &Account, new_account: &Account) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        if let Err(e) = notifier
            .send_referral_signup(
                &referrer.email,
                &referrer.full_name,
                &new_account.full_name,
                self.settings.referrer_bonus_credits,
            )
            .await
        {
            warn!(
                "Failed to send referral notification to {}: {}",
                referrer.email, e
            );
        }
    }
}
