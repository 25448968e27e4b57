//! Connection settings for the document drive

use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

/// Everything the client needs to reach one site's document library.
/// Built by the caller and handed to [`crate::DriveClient::new`].
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// e.g. `contoso.sharepoint.com`
    pub site_hostname: String,
    /// Server-relative site path, e.g. `/sites/Sales`
    pub site_path: String,
    #[serde(default = "default_authority_url")]
    pub authority_url: String,
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
    /// Default template location inside the drive
    #[serde(default)]
    pub template_path: Option<String>,
    /// Folder generated documents are uploaded to
    #[serde(default)]
    pub output_folder: String,
    /// When set, uploads return a sharing link of this scope
    /// (`anonymous`, `organization`) instead of the item URL
    #[serde(default)]
    pub share_scope: Option<String>,
}

fn default_authority_url() -> String {
    DEFAULT_AUTHORITY_URL.to_string()
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

impl StorageConfig {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        site_hostname: impl Into<String>,
        site_path: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            site_hostname: site_hostname.into(),
            site_path: site_path.into(),
            authority_url: default_authority_url(),
            graph_url: default_graph_url(),
            template_path: None,
            output_folder: String::new(),
            share_scope: None,
        }
    }

    /// Drive path for a generated document. `file_name` is kept a single
    /// path segment: separators in it become `_`.
    pub fn output_path(&self, file_name: &str) -> String {
        let file_name = file_name.replace(['/', '\\'], "_");
        let folder = self.output_folder.trim_matches('/');
        if folder.is_empty() {
            file_name
        } else {
            format!("{}/{}", folder, file_name)
        }
    }
}

// The secret never reaches logs
impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("site_hostname", &self.site_hostname)
            .field("site_path", &self.site_path)
            .field("authority_url", &self.authority_url)
            .field("graph_url", &self.graph_url)
            .field("template_path", &self.template_path)
            .field("output_folder", &self.output_folder)
            .field("share_scope", &self.share_scope)
            .finish()
    }
}
