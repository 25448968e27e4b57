//! Template personalization: parse, substitute, place image, serialize

use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument};

use crate::asset::ImageAsset;
use crate::error::PersonalizeError;
use crate::fields::{substitute, FieldMap};
use crate::placement::{place_image, ImagePlacement};
use crate::presentation::Presentation;

#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub slide_count: usize,
    pub replacements: usize,
    pub image: Option<ImagePlacement>,
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Personalized {
    pub bytes: Vec<u8>,
    pub report: ApplyReport,
}

/// Stateless; every call owns the document it parses, so one instance can
/// serve concurrent requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Personalizer;

impl Personalizer {
    pub fn new() -> Self {
        Self
    }

    /// Personalize `template` and return the new document bytes.
    ///
    /// The steps either all succeed or the whole call fails; no partial
    /// document is ever returned.
    pub fn apply(
        &self,
        template: &[u8],
        fields: &FieldMap,
        image: Option<&[u8]>,
    ) -> Result<Vec<u8>, PersonalizeError> {
        self.apply_with_report(template, fields, image)
            .map(|personalized| personalized.bytes)
    }

    #[instrument(skip_all, fields(template_bytes = template.len(), fields = fields.len(), has_image = image.is_some()))]
    pub fn apply_with_report(
        &self,
        template: &[u8],
        fields: &FieldMap,
        image: Option<&[u8]>,
    ) -> Result<Personalized, PersonalizeError> {
        let started = Instant::now();

        let mut presentation = Presentation::from_bytes(template.to_vec())?;
        let slide_count = presentation.slides().len();

        let replacements = substitute(&mut presentation, fields);

        let image = match image {
            Some(bytes) => {
                let asset = ImageAsset::from_bytes(bytes.to_vec())?;
                Some(place_image(&mut presentation, &asset)?)
            }
            None => None,
        };

        let bytes = presentation.into_bytes()?;

        let report = ApplyReport {
            slide_count,
            replacements,
            image,
            input_size_bytes: template.len(),
            output_size_bytes: bytes.len(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            slides = report.slide_count,
            replacements = report.replacements,
            image_from_placeholder = report.image.map(|p| p.from_placeholder),
            output_bytes = report.output_size_bytes,
            "Personalized presentation"
        );
        Ok(Personalized { bytes, report })
    }
}
