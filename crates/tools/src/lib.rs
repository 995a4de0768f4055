//! Shared setup for the command-line tools.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use delve_core::SimConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Logs go to stderr so tool output on stdout stays clean. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("delve_core=info,delve_tools=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .init();
}

pub fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    match path {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(SimConfig::default()),
    }
}
