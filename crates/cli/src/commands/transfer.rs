use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use flystore_core::Visibility;

use crate::config::AppConfig;

#[derive(Args)]
pub struct TransferArgs {
    /// Source path
    source: String,

    /// Destination path
    destination: String,

    /// Visibility of the destination (defaults to the source's)
    #[arg(long)]
    visibility: Option<Visibility>,
}

pub async fn copy(args: TransferArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let mut adapter = config.open_adapter()?;

    adapter
        .copy_file(&args.source, &args.destination, &transfer_config(&config, &args))
        .await
        .with_context(|| format!("failed to copy {} to {}", args.source, args.destination))?;

    println!("Copied {} -> {}", args.source, args.destination);
    Ok(())
}

pub async fn rename(args: TransferArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let mut adapter = config.open_adapter()?;

    adapter
        .move_file(&args.source, &args.destination, &transfer_config(&config, &args))
        .await
        .with_context(|| format!("failed to move {} to {}", args.source, args.destination))?;

    println!("Moved {} -> {}", args.source, args.destination);
    Ok(())
}

// The configured default visibility is left out so the source's carries over.
fn transfer_config(config: &AppConfig, args: &TransferArgs) -> flystore_core::Config {
    let mut transfer = flystore_core::Config::new();
    if let Some(visibility) = args.visibility {
        transfer = transfer.with_visibility(visibility);
    }
    if let Some(directory_visibility) = config.defaults.directory_visibility {
        transfer = transfer.with_directory_visibility(directory_visibility);
    }
    transfer
}
