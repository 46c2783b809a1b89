use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::AppConfig;
use crate::progress;

#[derive(Args)]
pub struct RemoveArgs {
    /// File or directory to delete
    path: String,

    /// Delete a directory and everything below it
    #[arg(short, long)]
    recursive: bool,
}

pub async fn run(args: RemoveArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let mut adapter = config.open_adapter()?;

    if args.recursive {
        let pb = progress::create_spinner(&format!("Deleting {}", args.path));
        let result = adapter.delete_directory(&args.path).await;
        pb.finish_and_clear();
        result.with_context(|| format!("failed to delete directory {}", args.path))?;
    } else {
        adapter
            .delete(&args.path)
            .await
            .with_context(|| format!("failed to delete {}", args.path))?;
    }

    println!("Deleted {}", args.path);
    Ok(())
}
