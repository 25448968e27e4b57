//! Request and response models for the deck API

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use deck_core::FieldMap;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const FIELD_COMPANY_NAME: &str = "Nombre_Empresa_Cliente";
pub const FIELD_COMPANY_SECTOR: &str = "Sector_Empresa_Cliente";
pub const FIELD_LOGO: &str = "Logo_Empresa_Cliente";
pub const FIELD_TEMPLATE_BASE64: &str = "Plantilla_Base64";
pub const FIELD_TEMPLATE_PATH: &str = "Plantilla_Ruta";

/// Body of `POST /generate`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "Nombre_Empresa_Cliente", default)]
    pub company_name: Option<String>,
    #[serde(rename = "Sector_Empresa_Cliente", default)]
    pub company_sector: Option<String>,
    #[serde(rename = "Logo_Empresa_Cliente", default)]
    pub logo: Option<LogoPayload>,
    #[serde(rename = "Plantilla_Base64", default)]
    pub template_base64: Option<String>,
    #[serde(rename = "Plantilla_Ruta", default)]
    pub template_path: Option<String>,
    /// Any other top-level value; strings become extra fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A file object as sent by the calling workflow; only `data` is used
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoPayload {
    #[serde(default)]
    pub data: Option<String>,
}

impl GenerateRequest {
    pub fn company_name(&self) -> &str {
        self.company_name.as_deref().unwrap_or_default()
    }

    /// `Presentacion_<company name>.pptx`
    pub fn file_name(&self) -> String {
        format!("Presentacion_{}.pptx", self.company_name())
    }

    /// The two known fields (empty when absent) plus every extra string
    pub fn fields(&self) -> FieldMap {
        let mut fields: FieldMap = self
            .extra
            .iter()
            .filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_string())))
            .collect();
        fields.insert(FIELD_COMPANY_NAME, self.company_name());
        fields.insert(
            FIELD_COMPANY_SECTOR,
            self.company_sector.as_deref().unwrap_or_default(),
        );
        fields
    }

    /// Inline template bytes, `None` if no inline template was sent
    pub fn inline_template(&self) -> Result<Option<Vec<u8>>, ApiError> {
        match self.template_base64.as_deref() {
            Some(data) if !data.trim().is_empty() => {
                decode_base64(FIELD_TEMPLATE_BASE64, data).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Logo bytes; an absent or empty payload means no image
    pub fn logo_bytes(&self) -> Result<Option<Vec<u8>>, ApiError> {
        match self.logo.as_ref().and_then(|l| l.data.as_deref()) {
            Some(data) if !data.trim().is_empty() => decode_base64(FIELD_LOGO, data).map(Some),
            _ => Ok(None),
        }
    }
}

/// Standard base64, ignoring ASCII whitespace (line-wrapped payloads)
pub fn decode_base64(field: &'static str, data: &str) -> Result<Vec<u8>, ApiError> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64
        .decode(compact)
        .map_err(|source| ApiError::Decode { field, source })
}

/// How the generated document is handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// JSON body with the document base64-encoded
    #[default]
    Base64,
    /// The document itself as an attachment
    Download,
    /// Stored in the document drive; JSON body with its URL
    Upload,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base64" => Ok(OutputMode::Base64),
            "download" => Ok(OutputMode::Download),
            "upload" => Ok(OutputMode::Upload),
            other => Err(format!("unknown output mode '{}'", other)),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Base64 => write!(f, "base64"),
            OutputMode::Download => write!(f, "download"),
            OutputMode::Upload => write!(f, "upload"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateQuery {
    pub output: Option<OutputMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub status: String,
    #[serde(rename = "nombre")]
    pub file_name: String,
    pub file_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    #[serde(rename = "nombre")]
    pub file_name: String,
    pub url: String,
}
