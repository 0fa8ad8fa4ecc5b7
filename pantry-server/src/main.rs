use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pantry_client::GeminiClient;
use pantry_server::{
    config::{Args, Config},
    routes::{create_router, AppState},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    // Parse command line arguments
    let args = Args::parse();

    // initialize tracing
    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    }

    // No key, no service
    let config = Config::load(args).context("Loading configuration")?;
    tracing::info!(
        "Using models {} and {}",
        config.gemini.text_model,
        config.gemini.image_model
    );
    let generator = Arc::new(GeminiClient::new(config.gemini));

    let state = AppState::new(generator);
    state
        .sessions
        .spawn_sweeper(Duration::from_secs(300), config.server.session_idle);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.address)
        .await
        .with_context(|| format!("Binding to {}", config.server.address))?;
    tracing::info!("Listening on {}", config.server.address);
    axum::serve(listener, app).await?;
    Ok(())
}
