//! Drive client
//!
//! Every operation acquires a client-credentials token, discovers the
//! site's default drive and then addresses items by path
//! (`/drives/{drive}/root:/{path}:/content`). Any non-success status is
//! returned as [`StorageError::Status`]; nothing is retried.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::config::StorageConfig;
use crate::error::StorageError;

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LinkResponse {
    link: Option<SharingLink>,
}

#[derive(Debug, Deserialize)]
struct SharingLink {
    #[serde(rename = "webUrl")]
    web_url: Option<String>,
}

/// A file in the drive, as returned by an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "webUrl")]
    pub web_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedItem {
    pub item: DriveItem,
    /// Sharing link when a share scope is configured, else the item URL
    pub url: String,
}

pub struct DriveClient {
    http: reqwest::Client,
    config: StorageConfig,
}

impl DriveClient {
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let required = [
            ("tenant_id", &config.tenant_id),
            ("client_id", &config.client_id),
            ("client_secret", &config.client_secret),
            ("site_hostname", &config.site_hostname),
            ("site_path", &config.site_path),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(StorageError::InvalidConfig(format!("{} is empty", name)));
        }
        Url::parse(&config.graph_url)
            .map_err(|e| StorageError::InvalidConfig(format!("graph_url: {}", e)))?;
        Url::parse(&config.authority_url)
            .map_err(|e| StorageError::InvalidConfig(format!("authority_url: {}", e)))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("drive-storage/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn graph(&self) -> &str {
        self.config.graph_url.trim_end_matches('/')
    }

    /// OAuth2 client-credentials grant
    #[instrument(skip(self), fields(tenant = %self.config.tenant_id))]
    pub async fn access_token(&self) -> Result<String, StorageError> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.authority_url.trim_end_matches('/'),
            self.config.tenant_id
        );
        let response = self
            .http
            .post(url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
            ])
            .send()
            .await?;
        let token: TokenResponse = check(response, "token request").await?.json().await?;
        debug!("Acquired access token");
        token.access_token.ok_or(StorageError::MissingField {
            stage: "token request",
            field: "access_token",
        })
    }

    /// Resolve the site, then its default document library
    #[instrument(skip(self, token), fields(site = %self.config.site_path))]
    pub async fn drive_id(&self, token: &str) -> Result<String, StorageError> {
        let site_path = format!("/{}", self.config.site_path.trim_start_matches('/'));
        let site_url = format!(
            "{}/sites/{}:{}",
            self.graph(),
            self.config.site_hostname,
            site_path
        );
        let response = self.http.get(site_url).bearer_auth(token).send().await?;
        let site: IdResponse = check(response, "site lookup").await?.json().await?;
        let site_id = site.id.ok_or(StorageError::MissingField {
            stage: "site lookup",
            field: "id",
        })?;

        let drive_url = format!("{}/sites/{}/drive", self.graph(), site_id);
        let response = self.http.get(drive_url).bearer_auth(token).send().await?;
        let drive: IdResponse = check(response, "drive lookup").await?.json().await?;
        let drive_id = drive.id.ok_or(StorageError::MissingField {
            stage: "drive lookup",
            field: "id",
        })?;
        debug!(site_id = %site_id, drive_id = %drive_id, "Resolved drive");
        Ok(drive_id)
    }

    /// `{graph}/drives/{drive}/root:/{path}:/content`, segments percent-encoded
    fn content_url(&self, drive_id: &str, path: &str) -> Result<Url, StorageError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((file, folders)) = segments.split_last() else {
            return Err(StorageError::InvalidConfig("empty item path".into()));
        };
        let mut url = Url::parse(self.graph())
            .map_err(|e| StorageError::InvalidConfig(format!("graph_url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidConfig("graph_url cannot be a base".into()))?
            .pop_if_empty()
            .extend(["drives", drive_id, "root:"])
            .extend(folders)
            .push(&format!("{}:", file))
            .push("content");
        Ok(url)
    }

    #[instrument(skip(self))]
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let token = self.access_token().await?;
        let drive_id = self.drive_id(&token).await?;
        let url = self.content_url(&drive_id, path)?;

        let response = self.http.get(url).bearer_auth(&token).send().await?;
        let bytes = check(response, "download").await?.bytes().await?;
        info!(path = %path, size = bytes.len(), "Downloaded drive item");
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadedItem, StorageError> {
        let token = self.access_token().await?;
        let drive_id = self.drive_id(&token).await?;
        let url = self.content_url(&drive_id, path)?;

        let response = self
            .http
            .put(url)
            .bearer_auth(&token)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        let item: DriveItem = check(response, "upload").await?.json().await?;
        info!(path = %path, item_id = %item.id, "Uploaded drive item");

        let url = match &self.config.share_scope {
            Some(scope) => self.create_link(&token, &drive_id, &item.id, scope).await?,
            None => item.web_url.clone(),
        };
        Ok(UploadedItem { item, url })
    }

    async fn create_link(
        &self,
        token: &str,
        drive_id: &str,
        item_id: &str,
        scope: &str,
    ) -> Result<String, StorageError> {
        let url = format!(
            "{}/drives/{}/items/{}/createLink",
            self.graph(),
            drive_id,
            item_id
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "type": "view", "scope": scope }))
            .send()
            .await?;
        let link: LinkResponse = check(response, "create link").await?.json().await?;
        link.link
            .and_then(|l| l.web_url)
            .ok_or(StorageError::MissingField {
                stage: "create link",
                field: "link.webUrl",
            })
    }
}

async fn check(response: Response, stage: &'static str) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Status {
        stage,
        status: status.as_u16(),
        body,
    })
}
