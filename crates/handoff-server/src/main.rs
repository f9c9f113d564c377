use clap::Parser;
use handoff_core::HandoffConfig;
use handoff_server::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "handoff-server")]
#[command(about = "SSO handoff bridge HTTP server")]
#[command(version)]
struct Args {
    /// Path to the configuration file (defaults to $HANDOFF_CONFIG, then handoff.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = HandoffConfig::load(args.config.as_deref())?;
    let addr = config.server.bind.clone();

    let state = Arc::new(AppState::init(config).await?);
    let app = handoff_server::router(state);

    tracing::info!("handoff-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
