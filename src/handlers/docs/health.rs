// Health check endpoint OpenAPI documentation

use serde_json::json;

pub fn health_endpoint() -> serde_json::Value {
    json!({
        "get": {
            "tags": ["Health"],
            "summary": "Health check endpoint",
            "description": "Returns the health status of the service and its dependencies",
            "operationId": "healthCheck",
            "responses": {
                "200": {
                    "description": "Service is healthy",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/HealthResponse" }
                        }
                    }
                },
                "503": {
                    "description": "Service is degraded",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/HealthResponse" }
                        }
                    }
                }
            }
        }
    })
}
