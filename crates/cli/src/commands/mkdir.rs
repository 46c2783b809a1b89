use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use flystore_core::Visibility;

use crate::config::AppConfig;

#[derive(Args)]
pub struct MkdirArgs {
    /// Directory to create
    path: String,

    /// Visibility of the directory
    #[arg(long)]
    visibility: Option<Visibility>,
}

pub async fn run(args: MkdirArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let mut adapter = config.open_adapter()?;

    let mut directory_config = config.defaults.config(None);
    if let Some(visibility) = args.visibility {
        directory_config = directory_config.with_directory_visibility(visibility);
    }

    adapter
        .create_directory(&args.path, &directory_config)
        .await
        .with_context(|| format!("failed to create directory {}", args.path))?;

    println!("Created {}", args.path);
    Ok(())
}
