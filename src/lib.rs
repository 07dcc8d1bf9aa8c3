// Library exports for the Miky backend core
// Exposes modules, state bootstrap and the router for binary and tests

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use db::{
    DieselPool, LedgerError, LedgerStore, MemoryLedger, PostgresLedger,
};
pub use middleware::{require_valid_signature, SIGNATURE_HEADER};
pub use models::{Account, SubscriptionPlan, SubscriptionStatus};
pub use services::{
    AttributionService, CommissionService, CommissionTable, EmailService, ReferralCodeService,
    MAX_COMMISSION_DEPTH,
};
pub use utils::ServiceError;

// Re-export route builders
pub use handlers::{docs_routes, referral_routes, webhook_routes};

/// Initialize application state for the production binary: Postgres pool,
/// embedded migrations, ledger store and the service graph.
pub async fn initialize_app_state() -> Result<AppState, Box<dyn std::error::Error>> {
    // Load environment
    dotenv::dotenv().ok();

    // Initialize config
    let config = app_config::config();

    // Initialize database pool
    info!("Initializing database pool...");
    let db_config = db::DieselDatabaseConfig::default();
    info!(
        "Database URL: {}",
        db::mask_connection_string(&db_config.url)
    );
    let diesel_pool = db::create_diesel_pool(db_config).await?;

    // Run migrations if enabled
    if migrations::should_run_migrations() {
        info!("Running embedded migrations...");
        let migration_config = migrations::MigrationConfig::default();
        migrations::run_all_migrations(&diesel_pool, migration_config)
            .await
            .map_err(|e| format!("Migration failed: {}", e))?;
    }

    let ledger: Arc<dyn LedgerStore> = Arc::new(PostgresLedger::new(diesel_pool));

    let email_service = if config.email.is_enabled() {
        Some(Arc::new(EmailService::new(config.email.clone())?))
    } else {
        info!("Email provider not configured, notifications disabled");
        None
    };

    Ok(AppState::build(
        Arc::new(config.clone()),
        ledger,
        email_service,
    ))
}

/// Assemble the full application router
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/referral", handlers::referral_routes())
        .nest("/webhooks", handlers::webhook_routes())
        .nest("/docs", handlers::docs_routes())
        .route("/health", get(health_check));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    use axum::Json;

    let timestamp = chrono::Utc::now().to_rfc3339();

    let (overall_healthy, ledger_health) = match state.ledger.health_check().await {
        Ok(()) => (
            true,
            serde_json::json!({
                "status": "healthy",
                "error": null
            }),
        ),
        Err(e) => (
            false,
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("Ledger store failed: {}", e)
            }),
        ),
    };

    let response = serde_json::json!({
        "status": if overall_healthy { "healthy" } else { "degraded" },
        "service": "miky-backend",
        "timestamp": timestamp,
        "components": {
            "ledger": ledger_health
        }
    });

    if overall_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
