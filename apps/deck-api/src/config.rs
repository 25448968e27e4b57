//! Service configuration from environment variables

use anyhow::{Context, Result};
use drive_storage::StorageConfig;

use crate::models::OutputMode;

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Used when a request has no `?output=`
    pub output_mode: OutputMode,
    pub max_body_bytes: usize,
    /// `None` unless every required `STORAGE_*` credential is set
    pub storage: Option<StorageConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            output_mode: OutputMode::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            storage: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT '{}' is not a port number", port))?,
            None => DEFAULT_PORT,
        };

        let output_mode = match get("OUTPUT_MODE") {
            Some(mode) => mode
                .parse::<OutputMode>()
                .map_err(anyhow::Error::msg)
                .context("OUTPUT_MODE")?,
            None => OutputMode::default(),
        };

        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(bytes) => bytes
                .trim()
                .parse::<usize>()
                .with_context(|| format!("MAX_BODY_BYTES '{}' is not a byte count", bytes))?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let storage = match (
            get("STORAGE_TENANT_ID"),
            get("STORAGE_CLIENT_ID"),
            get("STORAGE_CLIENT_SECRET"),
            get("STORAGE_SITE_HOSTNAME"),
            get("STORAGE_SITE_PATH"),
        ) {
            (Some(tenant), Some(client), Some(secret), Some(host), Some(site)) => {
                let mut storage = StorageConfig::new(tenant, client, secret, host, site);
                if let Some(url) = get("STORAGE_AUTHORITY_URL") {
                    storage.authority_url = url;
                }
                if let Some(url) = get("STORAGE_GRAPH_URL") {
                    storage.graph_url = url;
                }
                storage.template_path = get("STORAGE_TEMPLATE_PATH");
                storage.output_folder = get("STORAGE_OUTPUT_FOLDER").unwrap_or_default();
                storage.share_scope = get("STORAGE_SHARE_SCOPE");
                Some(storage)
            }
            _ => None,
        };

        Ok(Self {
            port,
            output_mode,
            max_body_bytes,
            storage,
        })
    }
}
