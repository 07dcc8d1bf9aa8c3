// Email sender - delivery to the Resend HTTP API with retry

use super::types::{EmailError, EmailMessage, ResendEmailPayload};
use rand::Rng;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Longest delay between retries, backoff is capped here
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct EmailSender {
    client: Arc<Client>,
    api_key: String,
    api_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl EmailSender {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            client: Arc::new(Client::new()),
            api_key,
            api_url,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Send a single email message
    #[instrument(skip(self, message), fields(to = ?message.to, subject = %message.subject))]
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let payload: ResendEmailPayload = message.into();

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => {
                info!("Email sent successfully");
                Ok(())
            },
            Ok(res) => {
                let status = res.status();
                let error_text = res
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());

                error!("Failed to send email. Status: {}, Error: {}", status, error_text);

                if status.as_u16() == 429 {
                    Err(EmailError::RateLimitExceeded)
                } else if status.is_server_error() {
                    Err(EmailError::ServiceUnavailable)
                } else {
                    Err(EmailError::SendError(format!(
                        "Email send failed with status {}: {}",
                        status, error_text
                    )))
                }
            },
            Err(e) => {
                error!("Network error while sending email: {:?}", e);
                Err(EmailError::SendError(format!("Network error: {}", e)))
            },
        }
    }

    /// Send with exponential backoff. Rate-limit responses are not retried.
    #[instrument(skip(self, message), fields(to = ?message.to, subject = %message.subject))]
    pub async fn send_with_retry(&self, message: EmailMessage) -> Result<(), EmailError> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.send(message.clone()).await {
                Ok(()) => return Ok(()),
                Err(EmailError::RateLimitExceeded) => {
                    warn!("Rate limit hit, not retrying");
                    return Err(EmailError::RateLimitExceeded);
                },
                Err(e) => {
                    warn!("Email send attempt {} failed: {:?}", attempt, e);
                    last_error = Some(e);

                    if attempt < self.max_retries {
                        let delay = Self::backoff_delay(self.retry_delay, attempt);
                        info!("Retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                    }
                },
            }
        }

        Err(last_error.unwrap_or_else(|| {
            EmailError::SendError("Failed after maximum retry attempts".to_string())
        }))
    }

    /// Exponential backoff with up to 25% jitter, capped at MAX_RETRY_DELAY
    fn backoff_delay(base: Duration, attempt: u32) -> Duration {
        let exp = 2_u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);
        let delay = base.checked_mul(exp).unwrap_or(MAX_RETRY_DELAY);
        let delay = delay.min(MAX_RETRY_DELAY);

        let jitter_ceiling = (delay.as_millis() / 4) as u64;
        let jitter = if jitter_ceiling > 0 {
            rand::thread_rng().gen_range(0..=jitter_ceiling)
        } else {
            0
        };

        delay + Duration::from_millis(jitter)
    }

    /// Check API key validity against the provider
    pub async fn health_check(&self) -> Result<(), EmailError> {
        let response = self
            .client
            .get(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await;

        match response {
            Ok(res) if res.status().as_u16() == 401 => {
                Err(EmailError::ConfigError("Invalid API key".to_string()))
            },
            Ok(_) => Ok(()),
            Err(_) => Err(EmailError::ServiceUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let base = Duration::from_secs(2);

        let first = EmailSender::backoff_delay(base, 1);
        assert!(first >= Duration::from_secs(2) && first < Duration::from_secs(3));

        let second = EmailSender::backoff_delay(base, 2);
        assert!(second >= Duration::from_secs(4) && second < Duration::from_secs(6));

        // Huge attempt numbers cap out instead of overflowing
        let capped = EmailSender::backoff_delay(base, 50);
        assert!(capped >= MAX_RETRY_DELAY);
        assert!(capped <= MAX_RETRY_DELAY + Duration::from_secs(15));
    }
}
