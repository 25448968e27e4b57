//! Application state for the deck API

use anyhow::{Context, Result};
use deck_core::Personalizer;
use drive_storage::DriveClient;

use crate::config::AppConfig;

pub struct AppState {
    pub config: AppConfig,
    pub personalizer: Personalizer,
    pub storage: Option<DriveClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let storage = match &config.storage {
            Some(storage_config) => {
                tracing::info!(
                    site = %storage_config.site_path,
                    host = %storage_config.site_hostname,
                    "Document storage enabled"
                );
                Some(
                    DriveClient::new(storage_config.clone())
                        .context("Invalid storage configuration")?,
                )
            }
            None => {
                tracing::info!("Document storage not configured; inline templates only");
                None
            }
        };

        Ok(Self {
            config,
            personalizer: Personalizer::new(),
            storage,
        })
    }
}
