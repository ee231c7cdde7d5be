//! CBO - Entry Point
//!
//! Binary entry point of the back office runtime. Lives in the `cbo` facade
//! crate next to the library re-exports.

use cbo::cli::{Cli, run};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    run(cli).await?;
    Ok(())
}
