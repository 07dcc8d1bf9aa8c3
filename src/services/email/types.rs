// Email types shared by builders and sender

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Failed to send email: {0}")]
    SendError(String),

    #[error("Email provider rate limit exceeded")]
    RateLimitExceeded,

    #[error("Email provider unavailable")]
    ServiceUnavailable,

    #[error("Email configuration error: {0}")]
    ConfigError(String),
}

/// Provider-agnostic email message
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
    pub reply_to: Option<String>,
}

impl EmailMessage {
    pub fn new(from: String, to: Vec<String>, subject: String, html: String) -> Self {
        Self {
            from,
            to,
            subject,
            html,
            text: None,
            reply_to: None,
        }
    }

    pub fn with_text(mut self, text: String) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_reply_to(mut self, reply_to: String) -> Self {
        self.reply_to = Some(reply_to);
        self
    }
}

/// Wire payload for the Resend HTTP API
#[derive(Debug, Serialize)]
pub struct ResendEmailPayload {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl From<EmailMessage> for ResendEmailPayload {
    fn from(message: EmailMessage) -> Self {
        Self {
            from: message.from,
            to: message.to,
            subject: message.subject,
            html: message.html,
            text: message.text,
            reply_to: message.reply_to,
        }
    }
}

/// Builders assemble one specific notification into an [`EmailMessage`]
pub trait EmailBuilder {
    fn build(&self) -> Result<EmailMessage, EmailError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_builder_chain() {
        let message = EmailMessage::new(
            "noreply@miky.ai".to_string(),
            vec!["user@example.com".to_string()],
            "Subject".to_string(),
            "<p>Body</p>".to_string(),
        )
        .with_text("Body".to_string())
        .with_reply_to("support@miky.ai".to_string());

        assert_eq!(message.text.as_deref(), Some("Body"));
        assert_eq!(message.reply_to.as_deref(), Some("support@miky.ai"));
    }

    #[test]
    fn test_payload_skips_empty_optionals() {
        let message = EmailMessage::new(
            "noreply@miky.ai".to_string(),
            vec!["user@example.com".to_string()],
            "Subject".to_string(),
            "<p>Body</p>".to_string(),
        );

        let payload: ResendEmailPayload = message.into();
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("reply_to"));
        assert!(!json.contains("\"text\""));
    }
}
