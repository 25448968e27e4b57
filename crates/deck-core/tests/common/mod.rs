//! In-memory PresentationML fixtures

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const NS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

pub const RUN_PROPS: &str = r#"<a:rPr lang="es-ES" sz="2400" b="1" dirty="0"><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill><a:latin typeface="Calibri"/></a:rPr>"#;

const PRESENTATION_MAIN: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";

/// A text shape whose paragraphs are lists of run texts
pub fn text_shape(id: u32, geometry: Option<(i64, i64, i64, i64)>, paragraphs: &[&[&str]]) -> String {
    let xfrm = geometry
        .map(|(x, y, cx, cy)| {
            format!(
                r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
                x, y, cx, cy
            )
        })
        .unwrap_or_default();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/>{paras}</p:txBody></p:sp>"#,
        id = id,
        xfrm = xfrm,
        paras = paragraphs_xml(paragraphs),
    )
}

/// A placeholder shape without its own transform
pub fn placeholder_shape(id: u32, kind: &str, idx: u32, paragraphs: &[&[&str]]) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Placeholder {id}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="{kind}" idx="{idx}"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paras}</p:txBody></p:sp>"#,
        id = id,
        kind = kind,
        idx = idx,
        paras = paragraphs_xml(paragraphs),
    )
}

/// A shape with no text frame
pub fn rect_shape(id: u32, geometry: (i64, i64, i64, i64)) -> String {
    let (x, y, cx, cy) = geometry;
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Rectangle {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:sp>"#,
    )
}

fn paragraphs_xml(paragraphs: &[&[&str]]) -> String {
    paragraphs
        .iter()
        .map(|runs| {
            let runs: String = runs
                .iter()
                .map(|text| format!("<a:r>{}<a:t>{}</a:t></a:r>", RUN_PROPS, escape(text)))
                .collect();
            format!(
                r#"<a:p><a:pPr algn="ctr"/>{}<a:endParaRPr lang="es-ES" dirty="0"/></a:p>"#,
                runs
            )
        })
        .collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn slide_xml(shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        NS = NS,
        shapes = shapes,
    )
}

pub struct TemplateBuilder {
    slides: Vec<String>,
    layout_shapes: String,
    master_shapes: String,
    main_content_type: String,
    extra_parts: Vec<(String, Vec<u8>)>,
}

impl Default for TemplateBuilder {
    fn default() -> Self {
        Self {
            slides: Vec::new(),
            layout_shapes: String::new(),
            master_shapes: String::new(),
            main_content_type: PRESENTATION_MAIN.to_string(),
            extra_parts: Vec::new(),
        }
    }
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slide whose shape tree holds `shapes`
    pub fn slide(mut self, shapes: &[String]) -> Self {
        self.slides.push(shapes.concat());
        self
    }

    pub fn layout_shapes(mut self, shapes: &[String]) -> Self {
        self.layout_shapes = shapes.concat();
        self
    }

    pub fn master_shapes(mut self, shapes: &[String]) -> Self {
        self.master_shapes = shapes.concat();
        self
    }

    pub fn main_content_type(mut self, content_type: &str) -> Self {
        self.main_content_type = content_type.to_string();
        self
    }

    pub fn extra_part(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.extra_parts.push((name.to_string(), bytes));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut parts: Vec<(String, Vec<u8>)> = Vec::new();

        let mut overrides = format!(
            r#"<Override PartName="/ppt/presentation.xml" ContentType="{}"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
            self.main_content_type
        );
        for n in 1..=self.slides.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                n
            ));
        }
        parts.push((
            "[Content_Types].xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{}</Types>"#,
                overrides
            )
            .into_bytes(),
        ));

        parts.push((
            "_rels/.rels".into(),
            rels(&[(
                "rId1",
                "officeDocument",
                "ppt/presentation.xml",
            )])
            .into_bytes(),
        ));

        let slide_ids: String = (0..self.slides.len())
            .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2))
            .collect();
        parts.push((
            "ppt/presentation.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
                NS = NS,
                ids = slide_ids
            )
            .into_bytes(),
        ));

        let slide_targets: Vec<(String, String)> = (0..self.slides.len())
            .map(|i| (format!("rId{}", i + 2), format!("slides/slide{}.xml", i + 1)))
            .collect();
        let mut pres_rels = vec![("rId1", "slideMaster", "slideMasters/slideMaster1.xml")];
        pres_rels.extend(
            slide_targets
                .iter()
                .map(|(id, target)| (id.as_str(), "slide", target.as_str())),
        );
        parts.push((
            "ppt/_rels/presentation.xml.rels".into(),
            rels(&pres_rels).into_bytes(),
        ));

        parts.push((
            "ppt/slideMasters/slideMaster1.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#,
                NS = NS,
                shapes = self.master_shapes
            )
            .into_bytes(),
        ));
        parts.push((
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".into(),
            rels(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]).into_bytes(),
        ));
        parts.push((
            "ppt/slideLayouts/slideLayout1.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld></p:sldLayout>"#,
                NS = NS,
                shapes = self.layout_shapes
            )
            .into_bytes(),
        ));
        parts.push((
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels".into(),
            rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]).into_bytes(),
        ));

        for (i, shapes) in self.slides.iter().enumerate() {
            parts.push((
                format!("ppt/slides/slide{}.xml", i + 1),
                slide_xml(shapes).into_bytes(),
            ));
            parts.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                rels(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]).into_bytes(),
            ));
        }

        parts.extend(self.extra_parts);
        zip_parts(&parts)
    }
}

fn rels(entries: &[(&str, &str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, kind, target)| {
            format!(
                r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}" Target="{}"/>"#,
                id, kind, target
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        body
    )
}

pub fn zip_parts(parts: &[(String, Vec<u8>)]) -> Vec<u8> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in parts {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// All entries of a ZIP container, in archive order
pub fn unzip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

pub fn part(bytes: &[u8], name: &str) -> Option<String> {
    unzip(bytes)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, data)| String::from_utf8(data).unwrap())
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([0u8, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
