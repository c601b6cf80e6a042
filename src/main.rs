//! Sessionward - bearer token session management CLI
//!
#![doc = "Main entry point for the sessionward command-line tool."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sessionward::cli::Cli;
use sessionward::commands;
use sessionward::config::SessionConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config = SessionConfig::load(&cli.config)?;
    config.validate()?;
    tracing::debug!(storage = %config.storage, "Configuration loaded");

    commands::dispatch(config, cli.command).await
}

/// Initialize tracing/logging for the application.
///
/// `RUST_LOG` takes precedence; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "sessionward=debug"
    } else {
        "sessionward=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
