// Webhook endpoints OpenAPI documentation

use serde_json::json;

pub fn account_created_endpoint() -> serde_json::Value {
    json!({
        "post": {
            "tags": ["Webhooks"],
            "summary": "Account created delivery from the auth collaborator",
            "description": "Provisions the ledger row (assigning a referral code) when absent, then runs signup attribution. Idempotent; redeliveries report already_attributed.",
            "operationId": "accountCreatedWebhook",
            "security": [{ "webhookSignature": [] }],
            "requestBody": {
                "required": true,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/AccountCreatedEvent" }
                    }
                }
            },
            "responses": {
                "200": {
                    "description": "Attribution outcome",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/AccountCreatedResponse" }
                        }
                    }
                },
                "400": {
                    "description": "Malformed payload",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/ErrorResponse" }
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
                }
            }
        }
    })
}

pub fn subscription_endpoint() -> serde_json::Value {
    json!({
        "post": {
            "tags": ["Webhooks"],
            "summary": "Subscription lifecycle delivery from the payment collaborator",
            "description": "Mirrors the plan/status onto the account. An active subscription also distributes commissions, keyed by the provider event id so redeliveries never double-credit.",
            "operationId": "subscriptionWebhook",
            "security": [{ "webhookSignature": [] }],
            "requestBody": {
                "required": true,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/SubscriptionEvent" }
                    }
                }
            },
            "responses": {
                "200": {
                    "description": "Event processed (distribution present for active subscriptions)",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/SubscriptionEventResponse" }
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
                    "description": "Account not found",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                        }
                    }
                },
                "500": {
                    "description": "Store failure mid-distribution; the provider should redeliver",
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
