// Structured audit logging for referral money movements
// Every attribution and distribution also lands in the referral_events
// table; these log lines exist for support and log-based alerting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub enum AuditAction {
    SignupAttributed,
    CommissionsDistributed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub account_id: Uuid,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

pub struct AuditLogger;

impl AuditLogger {
    pub fn log_attribution(
        account_id: Uuid,
        granted_credits: i32,
        referred_by: Option<&str>,
        referrer_id: Option<Uuid>,
    ) {
        Self::emit(AuditEntry {
            id: Uuid::new_v4(),
            action: AuditAction::SignupAttributed,
            account_id,
            details: serde_json::json!({
                "granted_credits": granted_credits,
                "referred_by": referred_by,
                "referrer_id": referrer_id,
            }),
            timestamp: Utc::now(),
        });
    }

    pub fn log_distribution(
        account_id: Uuid,
        event_id: Option<&str>,
        plan: &str,
        levels: usize,
        total_cents: i64,
    ) {
        Self::emit(AuditEntry {
            id: Uuid::new_v4(),
            action: AuditAction::CommissionsDistributed,
            account_id,
            details: serde_json::json!({
                "event_id": event_id,
                "plan": plan,
                "levels": levels,
                "total_cents": total_cents,
            }),
            timestamp: Utc::now(),
        });
    }

    fn emit(entry: AuditEntry) {
        let json_log = serde_json::to_string(&entry).unwrap_or_else(|e| {
            warn!("Failed to serialize audit entry: {}", e);
            format!("{:?}", entry)
        });

        info!(target: "audit", "{}", json_log);
    }
}
