//! # Huddle Server
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings (port 4098)
//! huddle
//!
//! # Run with custom config
//! huddle --config /path/to/huddle.toml
//!
//! # Run with environment variables
//! HUDDLE_PORT=8080 HUDDLE_REFRESH_INTERVAL_MS=5000 huddle
//! ```

use anyhow::Result;
use clap::Parser;
use huddle_server::{config::Config, handlers, metrics};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "huddle", version, about = "Realtime room presence hub")]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huddle=debug,huddle_server=debug,huddle_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    tracing::info!("Starting Huddle server on {}:{}", config.host, config.port);

    metrics::init_metrics();

    handlers::run_server(config).await?;

    Ok(())
}
