use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersonalizeError {
    #[error("Failed to parse template: {0}")]
    TemplateParse(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to serialize presentation: {0}")]
    Serialization(String),

    #[error("Presentation has no slides to place the image on")]
    NoSlides,
}

/// Errors raised while reading or writing a single XML part
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Malformed XML: {0}")]
    Malformed(String),

    #[error("XML write failed: {0}")]
    Write(String),
}
