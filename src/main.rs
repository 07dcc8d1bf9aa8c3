use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before anything reads them
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "miky_backend_core=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Miky backend core");

    let state = miky_backend_core::initialize_app_state()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize application state: {}", e))?;

    let listen_address = state.config.listen_address();
    let app = miky_backend_core::build_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_address).await?;
    info!("Listening on {}", listen_address);

    axum::serve(listener, app).await?;

    Ok(())
}
