use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use futures::TryStreamExt;

use flystore_core::StorageAttributes;

use super::format_bytes;
use crate::config::AppConfig;

#[derive(Args)]
pub struct ListArgs {
    /// Directory to list
    #[arg(default_value = "")]
    path: String,

    /// Include everything below the directory
    #[arg(short, long)]
    recursive: bool,
}

pub async fn run(args: ListArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let adapter = config.open_adapter()?;

    let mut entries: Vec<StorageAttributes> = adapter
        .list_contents(&args.path, args.recursive)
        .try_collect()
        .await
        .with_context(|| format!("failed to list {}", display_path(&args.path)))?;

    if entries.is_empty() {
        println!("No entries found.");
        return Ok(());
    }
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    println!(
        "{:<5} {:<10} {:<8} {:<20} {}",
        "TYPE", "SIZE", "ACCESS", "MODIFIED", "PATH"
    );
    println!("{}", "-".repeat(70));
    for entry in &entries {
        let (kind, size) = match entry {
            StorageAttributes::File(file) => (
                "file",
                file.file_size.map(format_bytes).unwrap_or_else(|| "-".into()),
            ),
            StorageAttributes::Directory(_) => ("dir", "-".to_string()),
        };
        println!(
            "{:<5} {:<10} {:<8} {:<20} {}",
            kind,
            size,
            entry
                .visibility()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".into()),
            entry
                .last_modified()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".into()),
            entry.path(),
        );
    }
    Ok(())
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}
