//! mbservices - Kite session API entry point

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session_api::{ServiceConfig, start_server};

/// Kite session management API
#[derive(Parser)]
#[clap(name = "mbservices", version)]
#[clap(about = "HTTP API for Kite TOTP generation, login and enctoken checks")]
struct Cli {
    /// Configuration file path
    #[clap(long, short = 'c', value_name = "FILE")]
    config: Option<String>,

    /// Print available routes and exit
    #[clap(long)]
    routes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_api=info,kite_session=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.routes {
        session_api::server::print_routes();
        return Ok(());
    }

    let config = ServiceConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.config {
        info!("Loaded configuration from: {}", path);
    }

    info!(
        "Starting mbservices v{} on {}",
        env!("CARGO_PKG_VERSION"),
        config.server_address()
    );

    if let Err(e) = start_server(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
