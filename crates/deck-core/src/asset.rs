//! Image payloads destined for a slide

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::error::PersonalizeError;

/// Raster formats a presentation can embed as a picture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
}

impl ImageKind {
    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::Tiff => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
        }
    }
}

/// A validated image: format sniffed from the magic bytes and header
/// dimensions readable
#[derive(Debug, Clone)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    format: ImageKind,
    width: u32,
    height: u32,
}

impl ImageAsset {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PersonalizeError> {
        if bytes.is_empty() {
            return Err(PersonalizeError::ImageDecode("image payload is empty".into()));
        }

        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| PersonalizeError::ImageDecode(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| PersonalizeError::ImageDecode("unrecognized image format".into()))?;
        let kind = ImageKind::from_format(format).ok_or_else(|| {
            PersonalizeError::ImageDecode(format!("unsupported image format {:?}", format))
        })?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| PersonalizeError::ImageDecode(e.to_string()))?;

        Ok(Self {
            bytes,
            format: kind,
            width,
            height,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageKind {
        self.format
    }

    /// Pixel dimensions from the image header
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
