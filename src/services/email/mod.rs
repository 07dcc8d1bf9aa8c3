// Email service module
// Coordinates template registration, message building and delivery

pub mod builders;
pub mod sender;
pub mod types;

use crate::app_config::EmailConfig;
use anyhow::Result;
use builders::{CommissionEarnedEmailBuilder, ReferralSignupEmailBuilder};
use handlebars::Handlebars;
use sender::EmailSender;
use std::sync::Arc;
use tracing::{info, instrument};
use types::EmailBuilder;

pub use types::{EmailError, EmailMessage};

/// Email service for referral program notifications
#[derive(Clone)]
pub struct EmailService {
    sender: EmailSender,
    config: EmailConfig,
    templates: Arc<Handlebars<'static>>,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let mut templates = Handlebars::new();
        Self::register_templates(&mut templates)?;

        let sender = EmailSender::new(
            config.resend_api_key.clone(),
            config.resend_api_url.clone(),
        )
        .with_max_retries(3)
        .with_retry_delay(std::time::Duration::from_secs(1));

        Ok(Self {
            sender,
            config,
            templates: Arc::new(templates),
        })
    }

    fn register_templates(templates: &mut Handlebars) -> Result<(), EmailError> {
        let referral_signup = include_str!("../../templates/email/referral_signup.html");
        templates
            .register_template_string("referral_signup", referral_signup)
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        let commission_earned = include_str!("../../templates/email/commission_earned.html");
        templates
            .register_template_string("commission_earned", commission_earned)
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        Ok(())
    }

    /// Tell a referrer that someone joined with their code
    #[instrument(skip(self))]
    pub async fn send_referral_signup(
        &self,
        to_email: &str,
        referrer_name: &str,
        new_user_name: &str,
        bonus_credits: i32,
    ) -> Result<(), EmailError> {
        info!("Sending referral signup notification to {}", to_email);

        let builder = ReferralSignupEmailBuilder::new(
            to_email,
            referrer_name,
            new_user_name,
            bonus_credits,
            &self.config,
            &self.templates,
        );

        let message = builder.build()?;
        self.sender.send_with_retry(message).await
    }

    /// Tell an ancestor that a commission landed on their balance
    #[instrument(skip(self))]
    #[allow(clippy::too_many_arguments)]
    pub async fn send_commission_earned(
        &self,
        to_email: &str,
        beneficiary_name: &str,
        amount_cents: i64,
        level: u8,
        plan: &str,
        is_new_subscription: bool,
    ) -> Result<(), EmailError> {
        info!("Sending commission notification to {}", to_email);

        let builder = CommissionEarnedEmailBuilder::new(
            to_email,
            beneficiary_name,
            amount_cents,
            level,
            plan,
            is_new_subscription,
            &self.config,
            &self.templates,
        );

        let message = builder.build()?;
        self.sender.send_with_retry(message).await
    }

    pub async fn health_check(&self) -> Result<(), EmailError> {
        self.sender.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> EmailConfig {
        EmailConfig {
            resend_api_key: "test_key".to_string(),
            resend_api_url: "https://api.resend.com/emails".to_string(),
            from_email: "noreply@test.com".to_string(),
            from_name: "Miky Test".to_string(),
            support_email: "support@test.com".to_string(),
            dashboard_url: "https://app.test.com/dashboard".to_string(),
        }
    }

    #[test]
    fn test_email_service_creation() {
        let service = EmailService::new(create_test_config());
        assert!(service.is_ok());
    }

    #[test]
    fn test_templates_render() {
        let service = EmailService::new(create_test_config()).unwrap();

        let builder = ReferralSignupEmailBuilder::new(
            "referrer@test.com",
            "Referrer",
            "Newcomer",
            50,
            &service.config,
            &service.templates,
        );
        let message = builder.build().unwrap();
        assert!(message.html.contains("Referrer"));
        assert!(message.html.contains("Newcomer"));
        assert!(message.html.contains("50"));

        let builder = CommissionEarnedEmailBuilder::new(
            "ancestor@test.com",
            "Ancestor",
            600,
            1,
            "pro",
            true,
            &service.config,
            &service.templates,
        );
        let message = builder.build().unwrap();
        assert!(message.html.contains("$6.00"));
        assert!(message.subject.contains("$6.00"));
    }
}
