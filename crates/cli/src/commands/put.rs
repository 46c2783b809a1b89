use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use flystore_core::Visibility;

use super::format_bytes;
use crate::config::AppConfig;
use crate::progress;

#[derive(Args)]
pub struct PutArgs {
    /// Local file to upload, or - for stdin
    source: PathBuf,

    /// Destination path in the store
    destination: String,

    /// Visibility of the written file
    #[arg(long)]
    visibility: Option<Visibility>,

    /// Explicit content type (S3 only)
    #[arg(long)]
    content_type: Option<String>,
}

pub async fn run(args: PutArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let mut adapter = config.open_adapter()?;

    let contents = if args.source.as_os_str() == "-" {
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .context("failed to read stdin")?;
        buffer
    } else {
        std::fs::read(&args.source)
            .with_context(|| format!("failed to read {}", args.source.display()))?
    };

    let mut write_config = config.defaults.config(args.visibility);
    if let Some(content_type) = args.content_type {
        write_config = write_config.with("content_type", content_type);
    }

    let pb = progress::create_spinner(&format!("Uploading {}", args.destination));
    let result = adapter
        .write(&args.destination, &contents, &write_config)
        .await;
    pb.finish_and_clear();
    result.with_context(|| format!("failed to write {}", args.destination))?;

    info!(
        path = %args.destination,
        size = contents.len(),
        "File written"
    );
    println!(
        "Wrote {} ({})",
        args.destination,
        format_bytes(contents.len() as u64)
    );
    Ok(())
}
