//! Decodes feed XML into a lightweight element tree.
//!
//! The tree keeps qualified names exactly as written (`dc:creator`,
//! `media:thumbnail`), so the dialect layer can look fields up by the
//! prefixes feeds actually use in practice without resolving namespaces.

use std::fmt::Write as _;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// SEC-003: Maximum element nesting depth accepted while decoding.
/// Prevents stack exhaustion when walking maliciously nested documents.
const MAX_DEPTH: usize = 128;

/// Errors produced while decoding a feed document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The XML could not be tokenized.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// Nesting depth exceeded [`MAX_DEPTH`].
    #[error("Document nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    /// The input held no root element.
    #[error("Document has no root element")]
    Empty,
}

/// A child of an [`Element`]: either a nested element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
}

/// A decoded XML element with its attributes and children in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the value of the named attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Iterates over child elements with the given qualified name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == name)
    }

    /// First child element with the given qualified name.
    ///
    /// The result borrows from `self` only, not from `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn has_element_children(&self) -> bool {
        self.elements().next().is_some()
    }

    /// Concatenation of the element's direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Trimmed text of the first child named `name`, if present and non-empty.
    pub fn child_text(&self, name: &str) -> Option<String> {
        let text = self.child(name)?.text();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }

    /// Re-serializes the element's children as markup.
    ///
    /// Used for inline XHTML content, where the host expects the markup
    /// itself rather than a flattened string.
    pub fn inner_markup(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(&mut out, child);
        }
        out
    }
}

fn write_node(out: &mut String, node: &XmlNode) {
    match node {
        XmlNode::Text(text) => out.push_str(&escape(text.as_str())),
        XmlNode::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (key, value) in &element.attrs {
                let _ = write!(out, " {}=\"{}\"", key, escape(value.as_str()));
            }
            if element.children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in &element.children {
                write_node(out, child);
            }
            let _ = write!(out, "</{}>", element.name);
        }
    }
}

/// Decodes an XML document into its root [`Element`].
///
/// Text and CDATA sections both become [`XmlNode::Text`]; comments,
/// processing instructions and the doctype are dropped.
///
/// # Errors
///
/// Returns [`DocumentError::Xml`] for malformed XML (including mismatched end
/// tags), [`DocumentError::MaxDepthExceeded`] for excessive nesting, and
/// [`DocumentError::Empty`] when no root element exists.
///
/// # Security
///
/// SEC-002: quick-xml (0.37) never expands `<!ENTITY>` declarations; only the
/// five predefined entities are resolved. Text containing an unknown entity is
/// kept verbatim rather than failing the whole document.
pub fn parse_document(xml: &str) -> Result<Element, DocumentError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(DocumentError::MaxDepthExceeded(MAX_DEPTH));
                }
                stack.push(start_element(&e, &reader));
            }
            Ok(Event::Empty(e)) => {
                let element = start_element(&e, &reader);
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = match e.unescape() {
                        Ok(text) => text.into_owned(),
                        Err(err) => {
                            tracing::debug!(error = %err, "Keeping text with unrecognized entity verbatim");
                            String::from_utf8_lossy(&e).into_owned()
                        }
                    };
                    push_text(parent, text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, String::from_utf8_lossy(&e.into_inner()).into_owned());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(DocumentError::Xml(e.to_string())),
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DocumentError::Xml("unexpected end of document".to_owned()));
    }

    root.ok_or(DocumentError::Empty)
}

fn start_element(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Element {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()));
    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(err) => {
                tracing::warn!(element = %element.name, error = %err, "Skipping malformed attribute");
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        element.attrs.push((key, value));
    }
    element
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn push_text(parent: &mut Element, text: String) {
    if let Some(XmlNode::Text(existing)) = parent.children.last_mut() {
        existing.push_str(&text);
    } else {
        parent.children.push(XmlNode::Text(text));
    }
}
