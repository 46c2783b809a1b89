use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use flystore_core::backend::local::PermissionStrategy;
use flystore_core::backend::s3::AclVisibilityConverter;
use flystore_core::{
    AsyncFilesystemAdapter, Config, LocalFilesystemAdapter, S3Bucket, S3FilesystemAdapter,
    SymbolicLinkPolicy, SyncToAsyncAdapter, Visibility,
};

const CONFIG_FILE: &str = "flystore.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub defaults: WriteDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AdapterConfig {
    #[serde(rename = "local")]
    Local {
        path: String,
        #[serde(default)]
        links: SymbolicLinkPolicy,
    },
    #[serde(rename = "s3")]
    S3 {
        endpoint: String,
        region: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        prefix: Option<String>,
        /// Visibility reported for, and given to, directory markers.
        directory_visibility: Option<Visibility>,
    },
}

/// Visibility applied to writes that do not ask for one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteDefaults {
    pub visibility: Option<Visibility>,
    pub directory_visibility: Option<Visibility>,
}

impl WriteDefaults {
    /// Base config for a write, with `visibility` taking precedence.
    pub fn config(&self, visibility: Option<Visibility>) -> Config {
        let mut config = Config::new();
        if let Some(visibility) = visibility.or(self.visibility) {
            config = config.with_visibility(visibility);
        }
        if let Some(directory_visibility) = self.directory_visibility {
            config = config.with_directory_visibility(directory_visibility);
        }
        config
    }
}

impl AppConfig {
    pub fn config_path(explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("flystore")
                .join(CONFIG_FILE),
        }
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::config_path(explicit);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("config not found at {}", path.display()))?;
        toml::from_str(&content).context("failed to parse config")
    }

    pub fn save(&self, explicit: Option<&Path>) -> Result<()> {
        let path = Self::config_path(explicit);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    pub fn open_adapter(&self) -> Result<Box<dyn AsyncFilesystemAdapter>> {
        match &self.adapter {
            AdapterConfig::Local { path, links } => {
                let strategy = PermissionStrategy::for_current_os()
                    .context("no permission strategy for this platform")?;
                let adapter = LocalFilesystemAdapter::with_options(path, strategy, *links)
                    .with_context(|| format!("failed to open local root {path}"))?;
                Ok(Box::new(SyncToAsyncAdapter::new(adapter)))
            }
            AdapterConfig::S3 {
                endpoint,
                region,
                bucket,
                access_key,
                secret_key,
                prefix,
                directory_visibility,
            } => {
                let client = S3Bucket::new(bucket, endpoint, region, access_key, secret_key)
                    .with_context(|| format!("failed to bind bucket {bucket}"))?;
                let converter = (*directory_visibility)
                    .map(AclVisibilityConverter::new)
                    .unwrap_or_default();
                Ok(Box::new(S3FilesystemAdapter::with_converter(
                    client,
                    prefix.as_deref().unwrap_or(""),
                    converter,
                )))
            }
        }
    }
}
