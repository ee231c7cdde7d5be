//! Command line entry point
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cbo` | Boot, run until Ctrl-C, then release MainDom and stop |
//! | `cbo --check` | Boot, print the runtime state as JSON, stop |

use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::runtime::{BootSequencer, BootedRuntime};
use cbo_domain::error::{Error, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command line interface
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "cbo")]
#[command(about = "CBO - back office composition and bootstrap runtime")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Boot, print the runtime state and exit
    #[arg(long)]
    pub check: bool,
}

/// Run the command
pub async fn run(cli: Cli) -> Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    let config = Arc::new(loader.load()?);

    let runtime = BootSequencer::new(config).boot().await?;

    if cli.check {
        println!("{}", serde_json::to_string_pretty(&status(&runtime))?);
        return runtime.shutdown().await;
    }

    info!("Runtime running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .map_err(|err| Error::io_with_source("Failed to listen for Ctrl-C", err))?;
    runtime.shutdown().await
}

/// Runtime state reported by `--check`
pub fn status(runtime: &BootedRuntime) -> serde_json::Value {
    let components: Vec<&str> = runtime
        .components()
        .iter()
        .map(|item| item.descriptor.name.as_str())
        .collect();
    serde_json::json!({
        "phase": runtime.state().phase(),
        "main_dom": {
            "lock": runtime.main_dom().lock_name(),
            "state": runtime.main_dom().state(),
        },
        "runtime_hash": runtime.runtime_hash(),
        "registrations": runtime.factory().len(),
        "components": components,
    })
}
