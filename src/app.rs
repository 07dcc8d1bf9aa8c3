// Application state shared across handlers
// Clients and services are constructed once at startup and injected here;
// handlers never reach for ambient globals.

use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::LedgerStore,
    services::{AttributionService, CommissionService, EmailService, ReferralCodeService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<dyn LedgerStore>,
    pub referral_codes: Arc<ReferralCodeService>,
    pub attribution_service: Arc<AttributionService>,
    pub commission_service: Arc<CommissionService>,
    pub email_service: Option<Arc<EmailService>>,
}

impl AppState {
    /// Wire the service graph over a ledger store. Used by the production
    /// bootstrap with the Postgres ledger and by tests with the in-memory
    /// ledger.
    pub fn build(
        config: Arc<AppConfig>,
        ledger: Arc<dyn LedgerStore>,
        email_service: Option<Arc<EmailService>>,
    ) -> Self {
        let referral_codes = Arc::new(ReferralCodeService::with_settings(
            ledger.clone(),
            config.referral.code_length,
            config.referral.code_max_retries,
        ));

        let attribution_service = Arc::new(
            AttributionService::new(ledger.clone(), config.referral.clone())
                .with_notifier(email_service.clone()),
        );

        let commission_service =
            Arc::new(CommissionService::new(ledger.clone()).with_notifier(email_service.clone()));

        Self {
            config,
            ledger,
            referral_codes,
            attribution_service,
            commission_service,
            email_service,
        }
    }
}
