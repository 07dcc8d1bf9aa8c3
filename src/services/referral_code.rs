// Referral code validation and generation
// Codes are uppercase alphanumeric, 4-12 characters, assigned once at
// account provisioning and immutable afterwards.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::db::{LedgerError, LedgerStore};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Inclusive bounds on referral code length
pub const MIN_CODE_LENGTH: usize = 4;
pub const MAX_CODE_LENGTH: usize = 12;

/// Valid shape of a stored referral code
static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{4,12}$").expect("static referral code pattern"));

/// Generation alphabet drops the confusable characters (0/O, 1/I/L);
/// validation still accepts the full uppercase alphanumeric charset
const GENERATION_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, Error)]
pub enum ReferralCodeError {
    #[error("Referral code is required")]
    Missing,

    #[error("Invalid code length: {0}. Length must be between {1} and {2} characters")]
    InvalidLength(usize, usize, usize),

    #[error("Referral codes may only contain letters and digits")]
    InvalidCharset,

    #[error("Failed to generate unique code after {0} attempts")]
    MaxRetriesExceeded(usize),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// =============================================================================
// VALIDATION RESULT
// =============================================================================

/// Outcome of a referral code validation. Exposes only a display name and
/// plan tier of the referrer, never the full account.
#[derive(Debug, Clone)]
pub struct CodeValidation {
    pub valid: bool,
    pub referrer_name: Option<String>,
    pub referrer_plan: Option<String>,
    pub message: String,
}

impl CodeValidation {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            referrer_name: None,
            referrer_plan: None,
            message: message.into(),
        }
    }
}

// =============================================================================
// SERVICE
// =============================================================================

pub struct ReferralCodeService {
    ledger: Arc<dyn LedgerStore>,
    code_length: usize,
    max_retries: usize,
}

impl ReferralCodeService {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self {
            ledger,
            code_length: 8,
            max_retries: 10,
        }
    }

    pub fn with_settings(
        ledger: Arc<dyn LedgerStore>,
        code_length: usize,
        max_retries: usize,
    ) -> Self {
        // Generated codes must themselves be valid codes
        let code_length = code_length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH);
        Self {
            ledger,
            code_length,
            max_retries,
        }
    }

    /// Trim and uppercase a candidate code before any further handling
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_ascii_uppercase()
    }

    /// Structural check only; never touches storage
    pub fn check_format(code: &str) -> Result<(), ReferralCodeError> {
        if code.is_empty() {
            return Err(ReferralCodeError::Missing);
        }
        if code.len() < MIN_CODE_LENGTH || code.len() > MAX_CODE_LENGTH {
            return Err(ReferralCodeError::InvalidLength(
                code.len(),
                MIN_CODE_LENGTH,
                MAX_CODE_LENGTH,
            ));
        }
        if !CODE_PATTERN.is_match(code) {
            return Err(ReferralCodeError::InvalidCharset);
        }
        Ok(())
    }

    /// Validate a candidate referral code against the ledger.
    /// Structurally invalid codes short-circuit to `valid:false` without a
    /// storage lookup; unknown codes are a well-formed negative answer.
    #[instrument(skip(self))]
    pub async fn validate(&self, raw_code: &str) -> Result<CodeValidation, ReferralCodeError> {
        let code = Self::normalize(raw_code);

        match Self::check_format(&code) {
            Ok(()) => {},
            Err(ReferralCodeError::Missing) => return Err(ReferralCodeError::Missing),
            Err(e) => return Ok(CodeValidation::invalid(e.to_string())),
        }

        match self.ledger.get_account_by_code(&code).await? {
            Some(referrer) => Ok(CodeValidation {
                valid: true,
                referrer_name: Some(referrer.full_name.clone()),
                referrer_plan: Some(referrer.subscription_plan.clone()),
                message: format!("Referral code belongs to {}", referrer.full_name),
            }),
            None => Ok(CodeValidation::invalid("Referral code not found")),
        }
    }

    /// Generate a unique referral code, retrying on ledger collisions
    #[instrument(skip(self))]
    pub async fn generate_unique(&self) -> Result<String, ReferralCodeError> {
        for attempt in 1..=self.max_retries {
            let candidate = self.random_code();

            if !self.ledger.referral_code_exists(&candidate).await? {
                if attempt > 1 {
                    info!(
                        "Generated referral code after {} attempts (collisions resolved)",
                        attempt
                    );
                }
                return Ok(candidate);
            }

            warn!(
                "Referral code collision on attempt {}/{}",
                attempt, self.max_retries
            );
        }

        Err(ReferralCodeError::MaxRetriesExceeded(self.max_retries))
    }

    fn random_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.code_length)
            .map(|_| {
                let idx = rng.gen_range(0..GENERATION_ALPHABET.len());
                GENERATION_ALPHABET[idx] as char
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryLedger;

    fn service(ledger: Arc<MemoryLedger>) -> ReferralCodeService {
        ReferralCodeService::new(ledger)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(ReferralCodeService::normalize("  ab12cd  "), "AB12CD");
        assert_eq!(ReferralCodeService::normalize("MIKY2024"), "MIKY2024");
    }

    #[test]
    fn test_check_format_bounds() {
        assert!(ReferralCodeService::check_format("ABCD").is_ok());
        assert!(ReferralCodeService::check_format("ABCD1234EF56").is_ok());
        assert!(matches!(
            ReferralCodeService::check_format("ABC"),
            Err(ReferralCodeError::InvalidLength(3, 4, 12))
        ));
        assert!(matches!(
            ReferralCodeService::check_format("ABCD1234EF567"),
            Err(ReferralCodeError::InvalidLength(13, 4, 12))
        ));
        assert!(matches!(
            ReferralCodeService::check_format("AB-12"),
            Err(ReferralCodeError::InvalidCharset)
        ));
        assert!(matches!(
            ReferralCodeService::check_format(""),
            Err(ReferralCodeError::Missing)
        ));
    }

    #[tokio::test]
    async fn test_validate_short_code_skips_storage() {
        let ledger = Arc::new(MemoryLedger::new());
        let service = service(ledger.clone());

        let result = service.validate("abc").await.unwrap();
        assert!(!result.valid);
        assert_eq!(ledger.lookup_count(), 0);

        let result = service.validate("THIRTEENCHARS").await.unwrap();
        assert!(!result.valid);
        assert_eq!(ledger.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_validate_is_case_insensitive() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger
            .seed_account("ref@example.com", "Referrer One", "MIKY2024", None)
            .await;
        let service = service(ledger.clone());

        let upper = service.validate("MIKY2024").await.unwrap();
        let lower = service.validate("miky2024").await.unwrap();

        assert!(upper.valid && lower.valid);
        assert_eq!(upper.referrer_name, lower.referrer_name);
        assert_eq!(upper.referrer_plan, lower.referrer_plan);
        assert_eq!(upper.referrer_name.as_deref(), Some("Referrer One"));
    }

    #[tokio::test]
    async fn test_validate_unknown_code() {
        let ledger = Arc::new(MemoryLedger::new());
        let service = service(ledger.clone());

        let result = service.validate("NOPE1234").await.unwrap();
        assert!(!result.valid);
        assert!(result.referrer_name.is_none());
        assert_eq!(ledger.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_unique_shape() {
        let ledger = Arc::new(MemoryLedger::new());
        let service = service(ledger);

        let code = service.generate_unique().await.unwrap();
        assert!(ReferralCodeService::check_format(&code).is_ok());
        // Confusable characters never appear in generated codes
        assert!(!code.contains('0') && !code.contains('O'));
        assert!(!code.contains('1') && !code.contains('I') && !code.contains('L'));
    }

    #[tokio::test]
    async fn test_generate_respects_length_settings() {
        let ledger = Arc::new(MemoryLedger::new());
        let service = ReferralCodeService::with_settings(ledger, 4, 3);

        let code = service.generate_unique().await.unwrap();
        assert_eq!(code.len(), 4);

        // Out-of-bounds requested lengths clamp into the valid range
        let ledger = Arc::new(MemoryLedger::new());
        let service = ReferralCodeService::with_settings(ledger, 40, 3);
        let code = service.generate_unique().await.unwrap();
        assert_eq!(code.len(), MAX_CODE_LENGTH);
    }
}
