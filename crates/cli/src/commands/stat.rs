use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use super::format_bytes;
use crate::config::AppConfig;

#[derive(Args)]
pub struct StatArgs {
    /// File to inspect
    path: String,
}

pub async fn run(args: StatArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let adapter = config.open_adapter()?;

    let exists = adapter
        .file_exists(&args.path)
        .await
        .with_context(|| format!("failed to check {}", args.path))?;
    if !exists {
        anyhow::bail!("{} does not exist", args.path);
    }

    let size = adapter.file_size(&args.path).await?;
    let modified = adapter.last_modified(&args.path).await?;
    let visibility = adapter.visibility(&args.path).await?;
    // Unknown types are reported rather than fatal here.
    let mime_type = adapter.mime_type(&args.path).await.ok();

    println!("Path:        {}", args.path);
    println!(
        "Size:        {}",
        size.file_size.map(format_bytes).unwrap_or_else(|| "-".into())
    );
    println!(
        "Modified:    {}",
        modified
            .last_modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".into())
    );
    println!(
        "Visibility:  {}",
        visibility
            .visibility
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".into())
    );
    println!(
        "Mime type:   {}",
        mime_type
            .and_then(|attributes| attributes.mime_type)
            .unwrap_or_else(|| "unknown".into())
    );
    Ok(())
}
