use api_rest::{AppState, router};
use api_shared::ENV_API_KEY;
use medai_core::CoreConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the MedAI application
///
/// Loads `.env`, resolves the core configuration once, and serves the REST API until Ctrl-C.
///
/// # Environment Variables
/// - `MEDAI_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MEDAI_OCR_URL`: OCR service base URL (default: "http://127.0.0.1:5000")
/// - `MEDAI_IMAGE_SEARCH_KEY` / `MEDAI_IMAGE_SEARCH_CX`: image search credentials; image
///   lookups are disabled without both
/// - `MEDAI_API_KEY`: API key required on mutating requests (optional)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medai=info".parse()?)
                .add_directive("medai_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MEDAI_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = CoreConfig::resolve(|key| std::env::var(key).ok())?;
    let api_key = std::env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty());

    tracing::info!("++ Starting MedAI REST on {}", rest_addr);
    tracing::info!(
        ocr = %cfg.ocr_url(),
        image_search = cfg.image_search_credentials().is_some(),
        api_key = api_key.is_some(),
        "++ Configuration resolved"
    );

    let app = router(AppState::from_config(&cfg, api_key)?);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("-- Shutting down MedAI REST");
        })
        .await?;

    Ok(())
}
