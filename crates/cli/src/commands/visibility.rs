use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use flystore_core::Visibility;

use crate::config::AppConfig;

#[derive(Args)]
pub struct VisibilityArgs {
    /// File or directory
    path: String,

    /// New visibility; omit to print the current one
    set: Option<Visibility>,
}

pub async fn run(args: VisibilityArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let mut adapter = config.open_adapter()?;

    match args.set {
        Some(visibility) => {
            adapter
                .set_visibility(&args.path, visibility)
                .await
                .with_context(|| format!("failed to set visibility of {}", args.path))?;
            info!(path = %args.path, %visibility, "Visibility changed");
            println!("{}: {visibility}", args.path);
        }
        None => {
            let attributes = adapter
                .visibility(&args.path)
                .await
                .with_context(|| format!("failed to read visibility of {}", args.path))?;
            let current = attributes
                .visibility
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".into());
            println!("{}: {current}", args.path);
        }
    }
    Ok(())
}
