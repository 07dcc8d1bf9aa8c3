// Referral endpoints OpenAPI documentation

use serde_json::json;

pub fn validate_endpoint() -> serde_json::Value {
    json!({
        "post": {
            "tags": ["Referral"],
            "summary": "Validate a referral code",
            "description": "Checks a candidate referral code. Codes are trimmed and uppercased; structurally invalid or unknown codes return valid:false with a 200.",
            "operationId": "validateReferralCode",
            "requestBody": {
                "required": true,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ValidateReferralRequest" }
                    }
                }
            },
            "responses": {
                "200": {
                    "description": "Validation outcome",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/ValidateReferralResponse" }
                        }
                    }
                },
                "400": {
                    "description": "Malformed request (missing or empty code)",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                        }
                    }
                }
            }
        }
    })
}

pub fn validate_query_endpoint() -> serde_json::Value {
    json!({
        "get": {
            "tags": ["Referral"],
            "summary": "Validate a referral code (query form)",
            "operationId": "validateReferralCodeQuery",
            "parameters": [{
                "name": "code",
                "in": "query",
                "required": true,
                "schema": { "type": "string" },
                "description": "Candidate referral code"
            }],
            "responses": {
                "200": {
                    "description": "Validation outcome",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/ValidateReferralResponse" }
                        }
                    }
                },
                "400": {
                    "description": "Missing code parameter",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                        }
                    }
                }
            }
        }
    })
}

pub fn commission_schedule_endpoint() -> serde_json::Value {
    json!({
        "get": {
            "tags": ["Referral"],
            "summary": "Preview the commission schedule for a plan",
            "description": "Per-level payout amounts for a plan. With user_id, each level also shows the ancestor that would be credited.",
            "operationId": "commissionSchedule",
            "parameters": [
                {
                    "name": "plan",
                    "in": "query",
                    "required": true,
                    "schema": { "type": "string", "enum": ["free", "plus", "pro"] }
                },
                {
                    "name": "user_id",
                    "in": "query",
                    "required": false,
                    "schema": { "type": "string", "format": "uuid" }
                }
            ],
            "responses": {
                "200": {
                    "description": "Commission schedule",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/SchedulePreview" }
                        }
                    }
                },
                "400": {
                    "description": "Unknown plan",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                        }
                    }
                },
                "404": {
                    "description": "Account not found",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                        }
                    }
                }
            }
        }
    })
}

pub fn trigger_distribution_endpoint() -> serde_json::Value {
    json!({
        "post": {
            "tags": ["Referral"],
            "summary": "Distribute commissions for a payment event",
            "description": "Walks up to five levels of referrer ancestry and credits each ancestor once. Signed delivery; repeated event ids are no-ops.",
            "operationId": "triggerDistribution",
            "security": [{ "webhookSignature": [] }],
            "requestBody": {
                "required": true,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/DistributionRequest" }
                    }
                }
            },
            "responses": {
                "200": {
                    "description": "Distribution result (including idempotent no-ops and skipped plans)",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/DistributionResult" }
                        }
                    }
                },
                "401": {
                    "description": "Missing or invalid signature",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                        }
                    }
                },
                "404": {
                    "description": "Paying account not found",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                        }
                    }
                }
            }
        }
    })
}
