use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::AppConfig;

#[derive(Args)]
pub struct CatArgs {
    /// File to print
    path: String,
}

pub async fn run(args: CatArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let adapter = config.open_adapter()?;

    let mut stream = adapter
        .read(&args.path)
        .await
        .with_context(|| format!("failed to read {}", args.path))?;
    let mut stdout = std::io::stdout().lock();
    std::io::copy(&mut stream, &mut stdout).context("failed to write to stdout")?;
    stdout.flush()?;
    Ok(())
}
