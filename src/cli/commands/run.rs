//! `run` command handler.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cli::args::RunArgs;
use crate::command::RouletteCommand;
use crate::config::{ConfigLoader, LoadResult, RouletteConfig};
use crate::error::RouletteError;
use crate::platform::{ConsoleInput, ConsolePlatform};
use crate::server::Server;

/// Serve the roulette command over stdin/stdout.
///
/// # Errors
///
/// Returns a config error if the configuration cannot be loaded, or an
/// I/O error if the input stream fails.
pub async fn run(args: &RunArgs, cancel: CancellationToken) -> Result<(), RouletteError> {
    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let mut config = match args.config {
        Some(ref path) => load(path)?,
        None => {
            tracing::info!("no configuration given, using defaults");
            RouletteConfig::default()
        }
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(seed) = config.seed {
        tracing::info!(seed, "using seeded random source");
    }

    let platform = Arc::new(ConsolePlatform::stdout());
    let command = RouletteCommand::from_config(&config, platform);
    let mut server = Server::new(ConsoleInput::stdin(), command, cancel);
    server.run().await?;
    Ok(())
}

fn load(path: &Path) -> Result<RouletteConfig, RouletteError> {
    tracing::info!(config = %path.display(), "loading configuration");
    let LoadResult { config, warnings } = ConfigLoader::with_defaults().load(path)?;

    for warning in &warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }

    Ok(Arc::unwrap_or_clone(config))
}
