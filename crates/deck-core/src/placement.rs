//! Image placement
//!
//! The image goes where the first shape containing the logo placeholder
//! sits (slide order, then shape order). That shape's text is cleared and
//! the picture takes its exact geometry. Without a placeholder, the picture
//! lands on the first slide at [`DEFAULT_IMAGE_GEOMETRY`].

use serde::Serialize;
use tracing::{debug, warn};

use crate::asset::ImageAsset;
use crate::error::PersonalizeError;
use crate::presentation::{Geometry, PlaceholderRef, Presentation};

/// Token marking the shape the image replaces. Fixed, not taken from the
/// field map.
pub const IMAGE_PLACEHOLDER: &str = "{{Logo_Empresa_Cliente}}";

pub const EMU_PER_INCH: i64 = 914_400;

/// 1in from the left, 1.5in from the top, 2in × 2in
pub const DEFAULT_IMAGE_GEOMETRY: Geometry = Geometry {
    left: EMU_PER_INCH,
    top: EMU_PER_INCH * 3 / 2,
    width: EMU_PER_INCH * 2,
    height: EMU_PER_INCH * 2,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImagePlacement {
    pub slide_index: usize,
    pub shape_id: u32,
    pub geometry: Geometry,
    /// `false` when the default position was used
    pub from_placeholder: bool,
}

struct Target {
    slide_index: usize,
    shape_index: usize,
    geometry: Option<Geometry>,
    placeholder: Option<PlaceholderRef>,
}

fn find_target(presentation: &Presentation) -> Option<Target> {
    presentation
        .slides()
        .iter()
        .enumerate()
        .find_map(|(slide_index, slide)| {
            slide
                .shapes()
                .enumerate()
                .find(|(_, shape)| {
                    shape.has_text_frame() && shape.text().contains(IMAGE_PLACEHOLDER)
                })
                .map(|(shape_index, shape)| Target {
                    slide_index,
                    shape_index,
                    geometry: shape.geometry(),
                    placeholder: shape.placeholder(),
                })
        })
}

pub fn place_image(
    presentation: &mut Presentation,
    image: &ImageAsset,
) -> Result<ImagePlacement, PersonalizeError> {
    if let Some(target) = find_target(presentation) {
        let geometry = match (target.geometry, &target.placeholder) {
            (Some(geometry), _) => Some(geometry),
            (None, Some(ph)) => presentation.inherited_geometry(target.slide_index, ph)?,
            (None, None) => None,
        };
        let geometry = geometry.unwrap_or_else(|| {
            warn!(
                slide = target.slide_index,
                shape = target.shape_index,
                "Logo placeholder has no resolvable geometry, using default position"
            );
            DEFAULT_IMAGE_GEOMETRY
        });

        presentation.slides_mut()[target.slide_index].clear_shape_text(target.shape_index);
        let shape_id = presentation.add_picture(target.slide_index, image, geometry)?;
        debug!(slide = target.slide_index, ?geometry, "Placed image at logo placeholder");
        return Ok(ImagePlacement {
            slide_index: target.slide_index,
            shape_id,
            geometry,
            from_placeholder: true,
        });
    }

    if presentation.slides().is_empty() {
        return Err(PersonalizeError::NoSlides);
    }
    let shape_id = presentation.add_picture(0, image, DEFAULT_IMAGE_GEOMETRY)?;
    debug!("No logo placeholder found, placed image on first slide");
    Ok(ImagePlacement {
        slide_index: 0,
        shape_id,
        geometry: DEFAULT_IMAGE_GEOMETRY,
        from_placeholder: false,
    })
}
