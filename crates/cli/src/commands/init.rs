use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::info;

use flystore_core::{SymbolicLinkPolicy, Visibility};

use crate::config::{AdapterConfig, AppConfig, WriteDefaults};

#[derive(Args)]
pub struct InitArgs {
    /// Adapter type: local or s3
    #[arg(long)]
    adapter: String,

    /// Root directory for the local adapter
    #[arg(long)]
    path: Option<String>,

    /// Skip symbolic links while listing instead of failing
    #[arg(long)]
    skip_links: bool,

    /// S3 endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// S3 bucket name
    #[arg(long)]
    bucket: Option<String>,

    /// S3 region
    #[arg(long, default_value = "auto")]
    region: String,

    /// S3 access key
    #[arg(long)]
    access_key: Option<String>,

    /// S3 secret key
    #[arg(long)]
    secret_key: Option<String>,

    /// S3 key prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Visibility for writes that do not specify one
    #[arg(long)]
    visibility: Option<Visibility>,

    /// Visibility for directories created along the way
    #[arg(long)]
    directory_visibility: Option<Visibility>,
}

pub async fn run(args: InitArgs, config_path: Option<&Path>) -> Result<()> {
    let adapter = match args.adapter.as_str() {
        "local" => {
            let path = args
                .path
                .ok_or_else(|| anyhow::anyhow!("--path required for local adapter"))?;
            let links = if args.skip_links {
                SymbolicLinkPolicy::SkipLinks
            } else {
                SymbolicLinkPolicy::DisallowLinks
            };
            AdapterConfig::Local { path, links }
        }
        "s3" => {
            let endpoint = args
                .endpoint
                .ok_or_else(|| anyhow::anyhow!("--endpoint required for S3 adapter"))?;
            let bucket = args
                .bucket
                .ok_or_else(|| anyhow::anyhow!("--bucket required for S3 adapter"))?;
            let access_key = args
                .access_key
                .ok_or_else(|| anyhow::anyhow!("--access-key required for S3 adapter"))?;
            let secret_key = args
                .secret_key
                .ok_or_else(|| anyhow::anyhow!("--secret-key required for S3 adapter"))?;
            AdapterConfig::S3 {
                endpoint,
                region: args.region,
                bucket,
                access_key,
                secret_key,
                prefix: args.prefix,
                directory_visibility: args.directory_visibility,
            }
        }
        other => anyhow::bail!("unknown adapter: {other} (supported: local, s3)"),
    };

    let config = AppConfig {
        adapter,
        defaults: WriteDefaults {
            visibility: args.visibility,
            directory_visibility: args.directory_visibility,
        },
    };

    // Opening the local adapter creates its root.
    config.open_adapter()?;
    config.save(config_path)?;

    let saved = AppConfig::config_path(config_path);
    info!(config_path = %saved.display(), "Adapter configured. Config saved.");
    println!("Config: {}", saved.display());
    Ok(())
}
