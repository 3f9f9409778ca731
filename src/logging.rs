//! Tracing subscriber setup for the command-line binary.

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Install a stderr subscriber. `RUST_LOG` wins over the verbosity flag.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "pipecheck=debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("failed to configure tracing level")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(env_filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}
