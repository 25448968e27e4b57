//! Owned XML element tree
//!
//! Parts are parsed into a tree of [`Element`]s built from `quick-xml`
//! events. Start tags keep their original bytes, so a part that is written
//! back differs from its input only where the tree was edited. Names are
//! matched by local name, which keeps lookups independent of the namespace
//! prefixes a producer chose.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::XmlError;

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(BytesText<'static>),
    /// Comments, CDATA, processing instructions
    Other(Event<'static>),
}

#[derive(Debug, Clone)]
pub struct Element {
    start: BytesStart<'static>,
    children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    /// Create an empty element with the given qualified name
    pub fn new(name: &str) -> Self {
        Self {
            start: BytesStart::new(name.to_owned()),
            children: Vec::new(),
            self_closing: true,
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.start.push_attribute((key, value));
        self
    }

    /// Parse a standalone fragment with exactly one root element
    pub fn parse_fragment(xml: &str) -> Result<Self, XmlError> {
        Ok(XmlDocument::parse(xml.as_bytes())?.root)
    }

    pub fn is(&self, local_name: &str) -> bool {
        self.start.local_name().as_ref() == local_name.as_bytes()
    }

    pub fn local_name(&self) -> String {
        String::from_utf8_lossy(self.start.local_name().as_ref()).into_owned()
    }

    /// Attribute value by exact qualified name (`"Id"`, `"r:embed"`)
    pub fn attribute(&self, qname: &str) -> Option<String> {
        self.start
            .attributes()
            .flatten()
            .find(|a| a.key.as_ref() == qname.as_bytes())
            .map(|a| String::from_utf8_lossy(&a.value).into_owned())
    }

    /// Attribute value by local name, restricted to namespace-prefixed
    /// attributes. Distinguishes `r:id` from a plain `id`.
    pub fn prefixed_attribute(&self, local_name: &str) -> Option<String> {
        self.start
            .attributes()
            .flatten()
            .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == local_name.as_bytes())
            .map(|a| String::from_utf8_lossy(&a.value).into_owned())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(local_name))
    }

    pub fn child_mut(&mut self, local_name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is(local_name))
    }

    /// Follow a chain of child names, e.g. `["spPr", "xfrm", "off"]`
    pub fn path(&self, names: &[&str]) -> Option<&Element> {
        names.iter().try_fold(self, |el, name| el.child(name))
    }

    pub fn path_mut(&mut self, names: &[&str]) -> Option<&mut Element> {
        let mut el = self;
        for name in names {
            el = el.child_mut(name)?;
        }
        Some(el)
    }

    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.is(local_name))
    }

    /// Visit this element and all of its descendants, depth first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Element)) {
        visit(self);
        for child in self.elements() {
            child.walk(visit);
        }
    }

    /// Concatenated, unescaped character data of the direct text children
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(t) = node {
                match t.unescape() {
                    Ok(s) => out.push_str(&s),
                    Err(_) => out.push_str(&String::from_utf8_lossy(t)),
                }
            }
        }
        out
    }

    /// Replace all text children with a single (escaped) text node.
    /// Characters XML 1.0 forbids are written as `_xHHHH_`.
    pub fn set_text(&mut self, text: &str) {
        self.children.retain(|n| !matches!(n, Node::Text(_)));
        if !text.is_empty() {
            let text = escape_forbidden_chars(text);
            self.children
                .push(Node::Text(BytesText::new(&text).into_owned()));
        }
        self.self_closing = false;
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// Drop child elements for which `keep` returns false. Non-element
    /// nodes are left in place.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&Element) -> bool) {
        self.children.retain(|n| match n {
            Node::Element(e) => keep(e),
            _ => true,
        });
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), XmlError> {
        if self.self_closing && self.children.is_empty() {
            return write_event(writer, Event::Empty(self.start.borrow()));
        }
        write_event(writer, Event::Start(self.start.borrow()))?;
        for node in &self.children {
            match node {
                Node::Element(e) => e.write(writer)?,
                Node::Text(t) => write_event(writer, Event::Text(t.clone()))?,
                Node::Other(ev) => write_event(writer, ev.borrow())?,
            }
        }
        write_event(writer, Event::End(self.start.to_end()))
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Replace characters outside the XML `Char` production with the
/// `_xHHHH_` form Office uses for them
pub fn escape_forbidden_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if is_xml_char(c) {
            out.push(c);
        } else {
            out.push_str(&format!("_x{:04X}_", c as u32));
        }
    }
    Cow::Owned(out)
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Write(e.to_string()))
}

/// A parsed XML part: declaration and trailing misc around one root
#[derive(Debug, Clone)]
pub struct XmlDocument {
    prolog: Vec<Event<'static>>,
    root: Element,
    epilog: Vec<Event<'static>>,
}

impl XmlDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self, XmlError> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| XmlError::Malformed(e.to_string()))?;
            match event {
                Event::Start(e) => stack.push(Element {
                    start: e.into_owned(),
                    children: Vec::new(),
                    self_closing: false,
                }),
                Event::Empty(e) => {
                    let element = Element {
                        start: e.into_owned(),
                        children: Vec::new(),
                        self_closing: true,
                    };
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XmlError::Malformed("unexpected end tag".into()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(t) => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(t.into_owned())),
                    None if root.is_none() => prolog.push(Event::Text(t.into_owned())),
                    None => epilog.push(Event::Text(t.into_owned())),
                },
                Event::Eof => break,
                other => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Other(other.into_owned())),
                    None if root.is_none() => prolog.push(other.into_owned()),
                    None => epilog.push(other.into_owned()),
                },
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(XmlError::Malformed("unclosed element at end of input".into()));
        }
        let root = root.ok_or_else(|| XmlError::Malformed("no root element".into()))?;
        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, XmlError> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.prolog {
            write_event(&mut writer, event.borrow())?;
        }
        self.root.write(&mut writer)?;
        for event in &self.epilog {
            write_event(&mut writer, event.borrow())?;
        }
        Ok(writer.into_inner())
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(XmlError::Malformed("multiple root elements".into()))
    }
}
