//! Slide deck template personalization
//!
//! Loads a PresentationML template, replaces `{{Field}}` placeholder tokens
//! inside text runs, places an optional image at the logo placeholder (or a
//! default position) and serializes the result.
//!
//! Parts that are not edited are copied through untouched; only the slides
//! that changed, their relationships and `[Content_Types].xml` are
//! rewritten.

pub mod asset;
pub mod error;
pub mod fields;
pub mod package;
pub mod personalizer;
pub mod placement;
pub mod presentation;
pub mod xml;

pub use asset::{ImageAsset, ImageKind};
pub use error::{PersonalizeError, XmlError};
pub use fields::{placeholder_token, substitute, FieldMap};
pub use personalizer::{ApplyReport, Personalized, Personalizer};
pub use placement::{
    place_image, ImagePlacement, DEFAULT_IMAGE_GEOMETRY, EMU_PER_INCH, IMAGE_PLACEHOLDER,
};
pub use presentation::{Geometry, Paragraph, PlaceholderRef, Presentation, Run, Shape, Slide};

/// MIME type of a `.pptx` document
pub const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
