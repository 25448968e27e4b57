//! Presentation document model
//!
//! `Presentation` → `Slide` → `Shape` → `Paragraph` → `Run`, each a view over
//! the slide part's element tree. Text edits go through runs only; the only
//! structural edits are clearing a shape's text and appending a picture.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::asset::ImageAsset;
use crate::error::PersonalizeError;
use crate::package::{
    ContentTypes, Package, Relationships, PACKAGE_RELS_PART, RT_IMAGE, RT_OFFICE_DOCUMENT,
    RT_SLIDE_LAYOUT, RT_SLIDE_MASTER,
};
use crate::xml::{Element, XmlDocument};

/// Main-part content types that identify a PresentationML package
const PRESENTATION_CONTENT_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
    "application/vnd.ms-powerpoint.presentation.macroEnabled.main+xml",
    "application/vnd.openxmlformats-officedocument.presentationml.template.main+xml",
    "application/vnd.ms-powerpoint.template.macroEnabled.main+xml",
    "application/vnd.openxmlformats-officedocument.presentationml.slideshow.main+xml",
    "application/vnd.ms-powerpoint.slideshow.macroEnabled.main+xml",
];

/// Direct children of `p:spTree` that count as shapes
const SHAPE_ELEMENTS: &[&str] = &[
    "sp",
    "grpSp",
    "graphicFrame",
    "cxnSp",
    "pic",
    "contentPart",
    "AlternateContent",
];

/// Position and size in EMU (English Metric Units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Geometry {
    fn from_xfrm(xfrm: &Element) -> Option<Self> {
        let off = xfrm.child("off")?;
        let ext = xfrm.child("ext")?;
        Some(Self {
            left: off.attribute("x")?.parse().ok()?,
            top: off.attribute("y")?.parse().ok()?,
            width: ext.attribute("cx")?.parse().ok()?,
            height: ext.attribute("cy")?.parse().ok()?,
        })
    }
}

/// Placeholder identity of a shape (`p:nvPr/p:ph`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    pub kind: String,
    pub idx: Option<u32>,
}

impl PlaceholderRef {
    /// Master placeholders are keyed by a reduced set of types
    fn base_kind(&self) -> &str {
        match self.kind.as_str() {
            "ctrTitle" => "title",
            "subTitle" | "obj" | "chart" | "tbl" | "clipArt" | "dgm" | "media" | "pic" => "body",
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Run<'a> {
    element: &'a Element,
}

impl<'a> Run<'a> {
    pub fn text(&self) -> String {
        self.element.child("t").map(Element::text).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paragraph<'a> {
    element: &'a Element,
}

impl<'a> Paragraph<'a> {
    pub fn runs(&self) -> impl Iterator<Item = Run<'a>> {
        self.element
            .children_named("r")
            .map(|element| Run { element })
    }

    /// Run and field text, with line breaks as vertical tabs
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in self.element.elements() {
            match child.local_name().as_str() {
                "r" | "fld" => {
                    if let Some(t) = child.child("t") {
                        out.push_str(&t.text());
                    }
                }
                "br" => out.push('\u{b}'),
                _ => {}
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Shape<'a> {
    element: &'a Element,
}

impl<'a> Shape<'a> {
    /// Element kind (`sp`, `pic`, `graphicFrame`, ...)
    pub fn kind(&self) -> String {
        self.element.local_name()
    }

    pub fn id(&self) -> Option<u32> {
        self.non_visual()?.child("cNvPr")?.attribute("id")?.parse().ok()
    }

    pub fn name(&self) -> Option<String> {
        self.non_visual()?.child("cNvPr")?.attribute("name")
    }

    fn non_visual(&self) -> Option<&'a Element> {
        self.element.elements().find(|e| e.local_name().starts_with("nv"))
    }

    pub fn has_text_frame(&self) -> bool {
        self.element.is("sp") && self.element.child("txBody").is_some()
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = Paragraph<'a>> {
        self.element
            .child("txBody")
            .filter(|_| self.element.is("sp"))
            .into_iter()
            .flat_map(|body| body.children_named("p"))
            .map(|element| Paragraph { element })
    }

    /// Flattened text, paragraphs joined with `\n`
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The shape's own transform; `None` when it inherits its position
    pub fn geometry(&self) -> Option<Geometry> {
        let xfrm = match self.kind().as_str() {
            "graphicFrame" => self.element.child("xfrm"),
            "grpSp" => self.element.path(&["grpSpPr", "xfrm"]),
            _ => self.element.path(&["spPr", "xfrm"]),
        }?;
        Geometry::from_xfrm(xfrm)
    }

    pub fn placeholder(&self) -> Option<PlaceholderRef> {
        let ph = self.non_visual()?.path(&["nvPr", "ph"])?;
        Some(PlaceholderRef {
            kind: ph.attribute("type").unwrap_or_else(|| "obj".to_string()),
            idx: ph.attribute("idx").and_then(|i| i.parse().ok()),
        })
    }
}

fn is_shape(element: &Element) -> bool {
    SHAPE_ELEMENTS.iter().any(|name| element.is(name))
}

fn sp_tree(root: &Element) -> Option<&Element> {
    root.path(&["cSld", "spTree"])
}

fn shapes_of(root: &Element) -> impl Iterator<Item = Shape<'_>> {
    sp_tree(root)
        .into_iter()
        .flat_map(|tree| tree.elements().filter(|e| is_shape(e)))
        .map(|element| Shape { element })
}

pub struct Slide {
    part_name: String,
    xml: XmlDocument,
    rels: Relationships,
    dirty: bool,
}

impl Slide {
    fn load(package: &mut Package, part_name: String) -> Result<Self, PersonalizeError> {
        let xml = package.read_xml(&part_name)?.ok_or_else(|| {
            PersonalizeError::TemplateParse(format!("missing slide part {}", part_name))
        })?;
        let rels = Relationships::load(package, &part_name)?;
        Ok(Self {
            part_name,
            xml,
            rels,
            dirty: false,
        })
    }

    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn shapes(&self) -> impl Iterator<Item = Shape<'_>> {
        shapes_of(self.xml.root())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply `edit` to the text of every run of every text frame. `edit`
    /// returns the new text, or `None` to leave the run untouched.
    pub fn edit_runs(&mut self, mut edit: impl FnMut(&str) -> Option<String>) -> usize {
        let mut changed = 0;
        let Some(tree) = self.xml.root_mut().path_mut(&["cSld", "spTree"]) else {
            return 0;
        };
        for shape in tree.elements_mut().filter(|e| e.is("sp")) {
            let Some(body) = shape.child_mut("txBody") else {
                continue;
            };
            for paragraph in body.elements_mut().filter(|e| e.is("p")) {
                for run in paragraph.elements_mut().filter(|e| e.is("r")) {
                    let Some(t) = run.child_mut("t") else {
                        continue;
                    };
                    if let Some(text) = edit(&t.text()) {
                        t.set_text(&text);
                        changed += 1;
                    }
                }
            }
        }
        if changed > 0 {
            self.dirty = true;
        }
        changed
    }

    /// Remove all text from the shape at `index`, keeping one empty
    /// paragraph with its properties
    pub fn clear_shape_text(&mut self, index: usize) {
        let Some(tree) = self.xml.root_mut().path_mut(&["cSld", "spTree"]) else {
            return;
        };
        let Some(shape) = tree.elements_mut().filter(|e| is_shape(e)).nth(index) else {
            return;
        };
        let Some(body) = shape.child_mut("txBody") else {
            return;
        };
        let mut seen_paragraph = false;
        body.retain_elements(|e| {
            if !e.is("p") {
                return true;
            }
            let keep = !seen_paragraph;
            seen_paragraph = true;
            keep
        });
        if let Some(first) = body.child_mut("p") {
            first.retain_elements(|e| e.is("pPr") || e.is("endParaRPr"));
        }
        self.dirty = true;
    }

    fn next_shape_id(&self) -> u32 {
        let mut max_id = 0;
        if let Some(tree) = sp_tree(self.xml.root()) {
            tree.walk(&mut |el: &Element| {
                if el.is("cNvPr") {
                    if let Some(id) = el.attribute("id").and_then(|v| v.parse::<u32>().ok()) {
                        max_id = max_id.max(id);
                    }
                }
            });
        }
        max_id + 1
    }

    fn append_picture(
        &mut self,
        rel_id: &str,
        geometry: Geometry,
        descr: &str,
    ) -> Result<u32, PersonalizeError> {
        let id = self.next_shape_id();
        let xml = format!(
            concat!(
                r#"<p:pic xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" "#,
                r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                r#"<p:nvPicPr><p:cNvPr id="{id}" name="Picture {n}" descr="{descr}"/>"#,
                r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
                r#"<p:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
                r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#
            ),
            id = id,
            n = id - 1,
            descr = descr,
            rel = rel_id,
            x = geometry.left,
            y = geometry.top,
            cx = geometry.width,
            cy = geometry.height,
        );
        let pic = Element::parse_fragment(&xml)
            .map_err(|e| PersonalizeError::Serialization(e.to_string()))?;
        let tree = self
            .xml
            .root_mut()
            .path_mut(&["cSld", "spTree"])
            .ok_or_else(|| {
                PersonalizeError::TemplateParse(format!("{} has no shape tree", self.part_name))
            })?;
        tree.push(pic);
        self.dirty = true;
        Ok(id)
    }

    fn save(&mut self, package: &mut Package) -> Result<(), PersonalizeError> {
        if self.dirty {
            package.write_xml(&self.part_name, &self.xml)?;
            self.dirty = false;
        }
        self.rels.save(package)
    }
}

pub struct Presentation {
    package: Package,
    content_types: ContentTypes,
    slides: Vec<Slide>,
}

impl Presentation {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PersonalizeError> {
        let mut package = Package::from_bytes(bytes)?;
        let content_types = ContentTypes::load(&mut package)?;

        let package_rels = Relationships::load(&mut package, "")?;
        let main_part = package_rels
            .first_of_type(RT_OFFICE_DOCUMENT)
            .and_then(|r| package_rels.target_part(&r.id))
            .ok_or_else(|| {
                PersonalizeError::TemplateParse(format!(
                    "{} has no office document relationship",
                    PACKAGE_RELS_PART
                ))
            })?;

        let content_type = content_types.content_type(&main_part).unwrap_or_default();
        if !PRESENTATION_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(PersonalizeError::TemplateParse(format!(
                "not a presentation: {} has content type '{}'",
                main_part, content_type
            )));
        }

        let main = package.read_xml(&main_part)?.ok_or_else(|| {
            PersonalizeError::TemplateParse(format!("missing main part {}", main_part))
        })?;
        let main_rels = Relationships::load(&mut package, &main_part)?;

        let slide_parts: Vec<String> = main
            .root()
            .child("sldIdLst")
            .into_iter()
            .flat_map(|list| list.children_named("sldId"))
            .filter_map(|sld| sld.prefixed_attribute("id"))
            .filter_map(|rel_id| main_rels.target_part(&rel_id))
            .collect();

        let mut slides = Vec::with_capacity(slide_parts.len());
        for part in slide_parts {
            slides.push(Slide::load(&mut package, part)?);
        }
        debug!(main_part = %main_part, slides = slides.len(), "Loaded presentation");

        Ok(Self {
            package,
            content_types,
            slides,
        })
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    /// Geometry a placeholder inherits from its layout, then its master
    pub fn inherited_geometry(
        &mut self,
        slide_index: usize,
        placeholder: &PlaceholderRef,
    ) -> Result<Option<Geometry>, PersonalizeError> {
        let Some(slide) = self.slides.get(slide_index) else {
            return Ok(None);
        };
        let Some(layout_part) = slide
            .rels
            .first_of_type(RT_SLIDE_LAYOUT)
            .and_then(|r| slide.rels.target_part(&r.id))
        else {
            return Ok(None);
        };
        let Some(layout) = self.package.read_xml(&layout_part)? else {
            return Ok(None);
        };

        let from_layout = shapes_of(layout.root())
            .find(|shape| {
                shape.placeholder().is_some_and(|ph| match placeholder.idx {
                    Some(idx) => ph.idx == Some(idx),
                    None => ph.kind == placeholder.kind,
                })
            })
            .and_then(|shape| shape.geometry());
        if from_layout.is_some() {
            return Ok(from_layout);
        }

        let layout_rels = Relationships::load(&mut self.package, &layout_part)?;
        let Some(master_part) = layout_rels
            .first_of_type(RT_SLIDE_MASTER)
            .and_then(|r| layout_rels.target_part(&r.id))
        else {
            return Ok(None);
        };
        let Some(master) = self.package.read_xml(&master_part)? else {
            return Ok(None);
        };
        let from_master = shapes_of(master.root())
            .find(|shape| {
                shape
                    .placeholder()
                    .is_some_and(|ph| ph.base_kind() == placeholder.base_kind())
            })
            .and_then(|shape| shape.geometry());
        Ok(from_master)
    }

    /// Store `image` as a media part and place it on a slide
    pub fn add_picture(
        &mut self,
        slide_index: usize,
        image: &ImageAsset,
        geometry: Geometry,
    ) -> Result<u32, PersonalizeError> {
        let extension = image.format().extension();
        // Numbered across extensions: image1.png blocks image1.jpeg
        let taken: HashSet<&str> = self
            .package
            .part_names()
            .filter_map(|name| name.strip_prefix("ppt/media/"))
            .filter_map(|file| file.rsplit_once('.').map(|(stem, _)| stem))
            .collect();
        let number = (1..)
            .find(|n| !taken.contains(format!("image{}", n).as_str()))
            .unwrap_or(1);
        let media_part = format!("ppt/media/image{}.{}", number, extension);

        let slide = self
            .slides
            .get_mut(slide_index)
            .ok_or(PersonalizeError::NoSlides)?;

        self.package.write_part(&media_part, image.bytes().to_vec());
        self.content_types
            .ensure_default(extension, image.format().content_type());
        let rel_id = slide.rels.add(RT_IMAGE, &media_part);
        let descr = format!("image.{}", extension);
        let shape_id = slide.append_picture(&rel_id, geometry, &descr)?;
        debug!(
            slide = slide_index,
            media = %media_part,
            shape_id,
            "Added picture"
        );
        Ok(shape_id)
    }

    /// Serialize, rewriting only the parts that changed
    pub fn into_bytes(self) -> Result<Vec<u8>, PersonalizeError> {
        let Presentation {
            mut package,
            mut content_types,
            mut slides,
        } = self;
        for slide in &mut slides {
            slide.save(&mut package)?;
        }
        content_types.save(&mut package)?;
        package.save()
    }
}
