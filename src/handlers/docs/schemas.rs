// Shared OpenAPI component schemas

use serde_json::json;

pub fn all_schemas() -> serde_json::Value {
    json!({
        "ErrorResponse": {
            "type": "object",
            "properties": {
                "error": { "type": "string" },
                "status": { "type": "integer" }
            }
        },
        "ValidateReferralRequest": {
            "type": "object",
            "required": ["referral_code"],
            "properties": {
                "referral_code": {
                    "type": "string",
                    "description": "Candidate code; trimmed and uppercased before lookup",
                    "example": "MIKY2024"
                }
            }
        },
        "ValidateReferralResponse": {
            "type": "object",
            "properties": {
                "valid": { "type": "boolean" },
                "referrer": {
                    "type": "object",
                    "nullable": true,
                    "properties": {
                        "name": { "type": "string" },
                        "plan": { "type": "string" }
                    }
                },
                "message": { "type": "string" }
            }
        },
        "SchedulePreview": {
            "type": "object",
            "properties": {
                "plan": { "type": "string" },
                "levels": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "level": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "amount_cents": { "type": "integer" },
                            "beneficiary_name": { "type": "string", "nullable": true }
                        }
                    }
                },
                "total_cents": { "type": "integer" },
                "reachable_levels": { "type": "integer", "nullable": true }
            }
        },
        "DistributionRequest": {
            "type": "object",
            "required": ["user_id", "subscription_plan"],
            "properties": {
                "user_id": { "type": "string", "format": "uuid" },
                "subscription_plan": { "type": "string", "example": "pro" },
                "is_new_subscription": { "type": "boolean", "default": false },
                "event_id": {
                    "type": "string",
                    "nullable": true,
                    "description": "Idempotency key; repeated keys no-op"
                }
            }
        },
        "DistributionResult": {
            "type": "object",
            "properties": {
                "paying_account_id": { "type": "string", "format": "uuid" },
                "plan": { "type": "string" },
                "is_new_subscription": { "type": "boolean" },
                "event_id": { "type": "string", "nullable": true },
                "already_processed": { "type": "boolean" },
                "skipped_reason": { "type": "string", "nullable": true },
                "applied": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "level": { "type": "integer" },
                            "beneficiary_id": { "type": "string", "format": "uuid" },
                            "beneficiary_name": { "type": "string" },
                            "amount_cents": { "type": "integer" }
                        }
                    }
                },
                "total_cents": { "type": "integer" }
            }
        },
        "AccountCreatedEvent": {
            "type": "object",
            "required": ["account_id", "email"],
            "properties": {
                "account_id": { "type": "string", "format": "uuid" },
                "email": { "type": "string", "format": "email" },
                "full_name": { "type": "string", "nullable": true },
                "referrer_code": {
                    "type": "string",
                    "nullable": true,
                    "description": "Referral code from signup metadata; invalid codes degrade to the base grant"
                }
            }
        },
        "AccountCreatedResponse": {
            "type": "object",
            "properties": {
                "account_id": { "type": "string", "format": "uuid" },
                "referral_code": { "type": "string" },
                "granted_credits": { "type": "integer" },
                "referred": { "type": "boolean" },
                "already_attributed": { "type": "boolean" }
            }
        },
        "SubscriptionEvent": {
            "type": "object",
            "required": ["event_id", "account_id", "plan", "status"],
            "properties": {
                "event_id": { "type": "string" },
                "account_id": { "type": "string", "format": "uuid" },
                "plan": { "type": "string", "example": "plus" },
                "status": {
                    "type": "string",
                    "enum": ["none", "active", "cancel_at_period_end", "canceled"]
                },
                "is_new_subscription": { "type": "boolean", "default": false }
            }
        },
        "SubscriptionEventResponse": {
            "type": "object",
            "properties": {
                "account_id": { "type": "string", "format": "uuid" },
                "plan": { "type": "string" },
                "status": { "type": "string" },
                "distribution": { "$ref": "#/components/schemas/DistributionResult" }
            }
        },
        "HealthResponse": {
            "type": "object",
            "properties": {
                "status": { "type": "string", "enum": ["healthy", "degraded"] },
                "service": { "type": "string" },
                "timestamp": { "type": "string", "format": "date-time" },
                "components": {
                    "type": "object",
                    "properties": {
                        "ledger": {
                            "type": "object",
                            "properties": {
                                "status": { "type": "string", "enum": ["healthy", "unhealthy"] },
                                "error": { "type": "string", "nullable": true }
                            }
                        }
                    }
                }
            }
        }
    })
}
