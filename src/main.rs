mod rest;

use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lims_core::{
    CoreConfig, LabStore, constants::DEFAULT_SAMPLE_ID_PREFIX, seed_file_from_env_value,
    transition_policy_from_env_value,
};

/// Main entry point for the LIMS REST service
///
/// Builds one in-memory [`LabStore`] and serves it over HTTP. State lives for the
/// lifetime of the process.
///
/// # Environment Variables
/// - `LIMS_REST_ADDR`: server address (default: "0.0.0.0:3000")
/// - `LIMS_CATALOG_FILE`: catalog seed file (default: built-in catalog)
/// - `LIMS_PANELS_FILE`: extra parameter panels (default: none)
/// - `LIMS_TRANSITION_POLICY`: `strict` or `permissive` (default: "strict")
/// - `LIMS_LAB_NAME`: laboratory name printed on reports
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configured seed file is missing or malformed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lims_run=info".parse()?)
                .add_directive("lims_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("LIMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::new(
        DEFAULT_SAMPLE_ID_PREFIX.into(),
        transition_policy_from_env_value(std::env::var("LIMS_TRANSITION_POLICY").ok())?,
        seed_file_from_env_value(std::env::var("LIMS_CATALOG_FILE").ok())?,
        seed_file_from_env_value(std::env::var("LIMS_PANELS_FILE").ok())?,
    )?
    .with_lab_name(std::env::var("LIMS_LAB_NAME").ok()));
    tracing::info!(policy = %cfg.transition_policy(), "transition policy");

    let store = LabStore::new(cfg)?;
    let app = rest::router(rest::AppState::new(store)).layer(CorsLayer::permissive());

    tracing::info!("++ Starting LIMS REST on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
