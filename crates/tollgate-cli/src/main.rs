//! Main entry point for the Tollgate CLI

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use tollgate_cli::cli::{Args, DEFAULT_LOG_FILTER};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    color_eyre::config::HookBuilder::default()
        .display_location_section(false)
        .display_env_section(false)
        .install()?;

    tollgate_common::logging::init_logging(&args.verbosity, DEFAULT_LOG_FILTER)
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

    Ok(args.run().await?)
}
