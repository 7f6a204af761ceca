//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging when you only want the REST server (with OpenAPI/Swagger
//! UI). The workspace's main `medai-run` binary does the same wiring and also loads `.env`.

use api_rest::{router, AppState};
use api_shared::ENV_API_KEY;
use medai_core::CoreConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the MedAI REST API server
///
/// # Environment Variables
/// - `MEDAI_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `MEDAI_API_KEY`: API key required on mutating requests (optional)
/// - `MEDAI_OCR_URL`, `MEDAI_IMAGE_SEARCH_*`, `MEDAI_HTTP_TIMEOUT_SECS`: see `CoreConfig`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the core configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("medai_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDAI_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = CoreConfig::resolve(|key| std::env::var(key).ok())?;
    let api_key = std::env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty());

    tracing::info!("-- Starting MedAI REST API on {}", addr);
    tracing::info!("-- OCR service at {}", cfg.ocr_url());

    let app = router(AppState::from_config(&cfg, api_key)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
