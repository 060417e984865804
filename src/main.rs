// =============================================================================
// main.rs — THE FRONT DOOR
// =============================================================================
//
// Parse a username, pick a log level, hand everything to the engine, print
// whatever it finds. All the interesting parts live in the library.
// =============================================================================

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, warn};
use tracing_subscriber::{fmt, EnvFilter};

use wmn_engine::config::{concurrency_limit, Config};
use wmn_engine::hunt;
use wmn_engine::output::{self, OutputFormat};
use wmn_engine::EngineError;

/// Find which sites have an account registered under a username.
#[derive(Debug, Parser)]
#[command(name = "wmn", version, about)]
struct Args {
    /// User to look up.
    #[arg(short, long, default_value = "")]
    user: String,

    /// Enable logs.
    #[arg(short, long)]
    verbose: bool,

    /// Registry URL or local JSON file. Overrides WMN_REGISTRY.
    #[arg(long)]
    registry: Option<String>,

    /// Per-probe timeout in seconds. Overrides WMN_PROBE_TIMEOUT_SECS.
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum probes in flight, 0 for unbounded. Overrides WMN_MAX_CONCURRENCY.
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Only probe sites in these categories (repeatable).
    #[arg(long = "category")]
    categories: Vec<String>,

    /// How to print matches.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl Args {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(registry) = &self.registry {
            config.registry = registry.clone();
        }
        if let Some(secs) = self.timeout {
            config.probe_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = self.max_concurrency {
            config.max_concurrency = concurrency_limit(limit);
        }
        config
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .init();
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = args.apply(Config::from_env());

    // Ctrl+C cancels every probe still in flight.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                warn!("🛑 Interrupted, cancelling in-flight probes");
                let _ = shutdown_tx.send(true);
            }
            Err(err) => error!("❌ Signal listener error: {}", err),
        }
    });

    let format = args.format;
    let outcome = hunt::run(&config, &args.user, &args.categories, &shutdown_rx, |hit| {
        if let Err(e) = output::write_match(&mut std::io::stdout().lock(), hit, format) {
            error!(error = %e, site = %hit.name, "Failed to print match");
        }
    })
    .await;

    match outcome {
        Ok(_) => Ok(()),
        Err(e @ EngineError::EmptyUsername) => Err(e).context("invalid arguments"),
        Err(e @ EngineError::Registry(_)) => Err(e).context("unable to load site registry"),
        Err(e) => Err(e).context("unable to start probing"),
    }
}
