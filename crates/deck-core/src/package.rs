//! OPC package access
//!
//! A presentation is a ZIP container of parts. Parts are read on demand from
//! the archive; parts that are written are held as overrides until
//! [`Package::save`], which copies every untouched entry raw so its
//! compressed bytes survive unchanged.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::PersonalizeError;
use crate::xml::{Element, XmlDocument};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const PACKAGE_RELS_PART: &str = "_rels/.rels";

pub const RT_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const RT_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const RT_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const RT_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub const RT_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const EMPTY_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#
);

pub struct Package {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    overrides: BTreeMap<String, Vec<u8>>,
}

impl Package {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PersonalizeError> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| PersonalizeError::TemplateParse(format!("not a ZIP container: {}", e)))?;
        Ok(Self {
            archive,
            overrides: BTreeMap::new(),
        })
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.overrides.contains_key(name) || self.archive.index_for_name(name).is_some()
    }

    /// Names of every part, archived or newly written
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.archive
            .file_names()
            .filter(|name| !self.overrides.contains_key(*name))
            .chain(self.overrides.keys().map(String::as_str))
    }

    /// Read a part's bytes, `None` if the package has no such part
    pub fn read_part(&mut self, name: &str) -> Result<Option<Vec<u8>>, PersonalizeError> {
        if let Some(bytes) = self.overrides.get(name) {
            return Ok(Some(bytes.clone()));
        }
        if self.archive.index_for_name(name).is_none() {
            return Ok(None);
        }
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|e| PersonalizeError::TemplateParse(format!("{}: {}", name, e)))?;
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| PersonalizeError::TemplateParse(format!("{}: {}", name, e)))?;
        Ok(Some(bytes))
    }

    pub fn read_xml(&mut self, name: &str) -> Result<Option<XmlDocument>, PersonalizeError> {
        match self.read_part(name)? {
            Some(bytes) => XmlDocument::parse(&bytes)
                .map(Some)
                .map_err(|e| PersonalizeError::TemplateParse(format!("{}: {}", name, e))),
            None => Ok(None),
        }
    }

    pub fn write_part(&mut self, name: &str, bytes: Vec<u8>) {
        self.overrides.insert(name.to_string(), bytes);
    }

    pub fn write_xml(&mut self, name: &str, doc: &XmlDocument) -> Result<(), PersonalizeError> {
        let bytes = doc
            .to_bytes()
            .map_err(|e| PersonalizeError::Serialization(format!("{}: {}", name, e)))?;
        self.write_part(name, bytes);
        Ok(())
    }

    /// Serialize the package. Entries keep their original order; new parts
    /// are appended.
    pub fn save(self) -> Result<Vec<u8>, PersonalizeError> {
        let Package {
            mut archive,
            mut overrides,
        } = self;
        let ser = |e: &dyn std::fmt::Display| PersonalizeError::Serialization(e.to_string());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for index in 0..archive.len() {
            let file = archive.by_index_raw(index).map_err(|e| ser(&e))?;
            let name = file.name().to_string();
            match overrides.remove(&name) {
                Some(bytes) => {
                    drop(file);
                    writer.start_file(name, options).map_err(|e| ser(&e))?;
                    writer.write_all(&bytes).map_err(|e| ser(&e))?;
                }
                None => writer.raw_copy_file(file).map_err(|e| ser(&e))?,
            }
        }

        for (name, bytes) in overrides {
            writer.start_file(name, options).map_err(|e| ser(&e))?;
            writer.write_all(&bytes).map_err(|e| ser(&e))?;
        }

        let cursor = writer.finish().map_err(|e| ser(&e))?;
        Ok(cursor.into_inner())
    }
}

/// Directory of a part name, without trailing slash (`ppt/slides`)
fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// The `_rels` part that holds a part's relationships
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns it
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = part_dir(source_part)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Relative reference from one part to another (`../media/image1.png`)
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let from: Vec<&str> = part_dir(source_part)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let to: Vec<&str> = target_part.split('/').collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = std::iter::repeat("..").take(from.len() - common).collect();
    parts.extend(&to[common..]);
    parts.join("/")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// The relationship table of one part
#[derive(Debug, Clone)]
pub struct Relationships {
    source_part: String,
    doc: XmlDocument,
    dirty: bool,
}

impl Relationships {
    /// Load the relationships of `source_part`; an absent rels part yields
    /// an empty table
    pub fn load(package: &mut Package, source_part: &str) -> Result<Self, PersonalizeError> {
        let rels_part = rels_part_for(source_part);
        let doc = match package.read_xml(&rels_part)? {
            Some(doc) => doc,
            None => XmlDocument::parse(EMPTY_RELS.as_bytes())
                .map_err(|e| PersonalizeError::TemplateParse(e.to_string()))?,
        };
        Ok(Self {
            source_part: source_part.to_string(),
            doc,
            dirty: false,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Relationship> + '_ {
        self.doc.root().children_named("Relationship").map(|el| Relationship {
            id: el.attribute("Id").unwrap_or_default(),
            rel_type: el.attribute("Type").unwrap_or_default(),
            target: el.attribute("Target").unwrap_or_default(),
            external: el.attribute("TargetMode").as_deref() == Some("External"),
        })
    }

    pub fn get(&self, id: &str) -> Option<Relationship> {
        self.iter().find(|r| r.id == id)
    }

    pub fn first_of_type(&self, rel_type: &str) -> Option<Relationship> {
        self.iter().find(|r| r.rel_type == rel_type)
    }

    /// Resolved part name of an internal relationship
    pub fn target_part(&self, id: &str) -> Option<String> {
        self.get(id)
            .filter(|r| !r.external)
            .map(|r| resolve_target(&self.source_part, &r.target))
    }

    /// Add an internal relationship to `target_part`, returning the new id
    pub fn add(&mut self, rel_type: &str, target_part: &str) -> String {
        let used: Vec<String> = self.iter().map(|r| r.id).collect();
        let id = (1..)
            .map(|n| format!("rId{}", n))
            .find(|candidate| !used.contains(candidate))
            .unwrap_or_default();
        let target = relative_target(&self.source_part, target_part);
        self.doc.root_mut().push(
            Element::new("Relationship")
                .with_attribute("Id", &id)
                .with_attribute("Type", rel_type)
                .with_attribute("Target", &target),
        );
        self.dirty = true;
        id
    }

    pub fn save(&mut self, package: &mut Package) -> Result<(), PersonalizeError> {
        if self.dirty {
            package.write_xml(&rels_part_for(&self.source_part), &self.doc)?;
            self.dirty = false;
        }
        Ok(())
    }
}

/// `[Content_Types].xml`
pub struct ContentTypes {
    doc: XmlDocument,
    dirty: bool,
}

impl ContentTypes {
    pub fn load(package: &mut Package) -> Result<Self, PersonalizeError> {
        let doc = package.read_xml(CONTENT_TYPES_PART)?.ok_or_else(|| {
            PersonalizeError::TemplateParse(format!("missing {}", CONTENT_TYPES_PART))
        })?;
        Ok(Self { doc, dirty: false })
    }

    /// Content type of a part: its override, else the default for its
    /// extension
    pub fn content_type(&self, part: &str) -> Option<String> {
        let part_name = format!("/{}", part);
        let root = self.doc.root();
        root.children_named("Override")
            .find(|o| {
                o.attribute("PartName")
                    .is_some_and(|p| p.eq_ignore_ascii_case(&part_name))
            })
            .and_then(|o| o.attribute("ContentType"))
            .or_else(|| {
                let ext = part.rsplit_once('.')?.1;
                root.children_named("Default")
                    .find(|d| {
                        d.attribute("Extension")
                            .is_some_and(|e| e.eq_ignore_ascii_case(ext))
                    })
                    .and_then(|d| d.attribute("ContentType"))
            })
    }

    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        let exists = self.doc.root().children_named("Default").any(|d| {
            d.attribute("Extension")
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        });
        if !exists {
            self.doc.root_mut().push(
                Element::new("Default")
                    .with_attribute("Extension", extension)
                    .with_attribute("ContentType", content_type),
            );
            self.dirty = true;
        }
    }

    pub fn save(&mut self, package: &mut Package) -> Result<(), PersonalizeError> {
        if self.dirty {
            package.write_xml(CONTENT_TYPES_PART, &self.doc)?;
            self.dirty = false;
        }
        Ok(())
    }
}
