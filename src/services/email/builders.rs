// Email builders for referral program notifications

use super::types::{EmailBuilder, EmailError, EmailMessage};
use crate::app_config::EmailConfig;
use handlebars::Handlebars;
use serde_json::json;

/// Format a cent amount as dollars for display ("$5.00")
pub fn format_cents(amount_cents: i64) -> String {
    format!("${}.{:02}", amount_cents / 100, amount_cents % 100)
}

/// Notification to a referrer when someone signs up with their code
pub struct ReferralSignupEmailBuilder<'a> {
    to_email: &'a str,
    referrer_name: &'a str,
    new_user_name: &'a str,
    bonus_credits: i32,
    config: &'a EmailConfig,
    templates: &'a Handlebars<'static>,
}

impl<'a> ReferralSignupEmailBuilder<'a> {
    pub fn new(
        to_email: &'a str,
        referrer_name: &'a str,
        new_user_name: &'a str,
        bonus_credits: i32,
        config: &'a EmailConfig,
        templates: &'a Handlebars<'static>,
    ) -> Self {
        Self {
            to_email,
            referrer_name,
            new_user_name,
            bonus_credits,
            config,
            templates,
        }
    }
}

impl EmailBuilder for ReferralSignupEmailBuilder<'_> {
    fn build(&self) -> Result<EmailMessage, EmailError> {
        let html = self
            .templates
            .render(
                "referral_signup",
                &json!({
                    "referrer_name": self.referrer_name,
                    "new_user_name": self.new_user_name,
                    "bonus_credits": self.bonus_credits,
                    "dashboard_url": self.config.dashboard_url,
                    "support_email": self.config.support_email,
                }),
            )
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        let text = format!(
            "{} just signed up with your referral code. You earned {} credits!",
            self.new_user_name, self.bonus_credits
        );

        Ok(EmailMessage::new(
            format!("{} <{}>", self.config.from_name, self.config.from_email),
            vec![self.to_email.to_string()],
            format!("{} joined Miky through your referral", self.new_user_name),
            html,
        )
        .with_text(text)
        .with_reply_to(self.config.support_email.clone()))
    }
}

/// Notification to an ancestor when a commission lands on their balance
pub struct CommissionEarnedEmailBuilder<'a> {
    to_email: &'a str,
    beneficiary_name: &'a str,
    amount_cents: i64,
    level: u8,
    plan: &'a str,
    is_new_subscription: bool,
    config: &'a EmailConfig,
    templates: &'a Handlebars<'static>,
}

impl<'a> CommissionEarnedEmailBuilder<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        to_email: &'a str,
        beneficiary_name: &'a str,
        amount_cents: i64,
        level: u8,
        plan: &'a str,
        is_new_subscription: bool,
        config: &'a EmailConfig,
        templates: &'a Handlebars<'static>,
    ) -> Self {
        Self {
            to_email,
            beneficiary_name,
            amount_cents,
            level,
            plan,
            is_new_subscription,
            config,
            templates,
        }
    }
}

impl EmailBuilder for CommissionEarnedEmailBuilder<'_> {
    fn build(&self) -> Result<EmailMessage, EmailError> {
        let amount = format_cents(self.amount_cents);
        let trigger = if self.is_new_subscription {
            "a new subscription"
        } else {
            "a subscription renewal"
        };

        let html = self
            .templates
            .render(
                "commission_earned",
                &json!({
                    "beneficiary_name": self.beneficiary_name,
                    "amount": amount,
                    "level": self.level,
                    "plan": self.plan,
                    "trigger": trigger,
                    "dashboard_url": self.config.dashboard_url,
                    "support_email": self.config.support_email,
                }),
            )
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        let text = format!(
            "You earned {} from {} in your network (level {}, {} plan).",
            amount, trigger, self.level, self.plan
        );

        Ok(EmailMessage::new(
            format!("{} <{}>", self.config.from_name, self.config.from_email),
            vec![self.to_email.to_string()],
            format!("You earned {} in referral commissions", amount),
            html,
        )
        .with_text(text)
        .with_reply_to(self.config.support_email.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(20), "$0.20");
        assert_eq!(format_cents(200), "$2.00");
        assert_eq!(format_cents(1460), "$14.60");
    }
}
