//! Event-driven XML reader building the document tree
//!
//! General entities declared in the internal DTD subset
//! (`<!ENTITY name "value">`) are expanded in text and attribute values.
//! Replacement text is taken literally, without further expansion. External
//! and parameter entities are not supported.

use super::{Element, Node, TextNode};
use crate::domain::DocumentError;
use encoding_rs::{Encoding, UTF_8};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;

/// Decode raw document bytes to text
///
/// A byte order mark wins over the declared encoding; without either the
/// input must be UTF-8.
pub(super) fn decode_input(bytes: &[u8]) -> Result<Cow<'_, str>, DocumentError> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (declared_encoding(bytes)?.unwrap_or(UTF_8), bytes),
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| DocumentError::Encoding(format!("invalid {} input", encoding.name())))
}

/// Encoding named by the XML declaration, if there is one
fn declared_encoding(bytes: &[u8]) -> Result<Option<&'static Encoding>, DocumentError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let Ok(Event::Decl(decl)) = reader.read_event_into(&mut buf) else {
        return Ok(None);
    };
    let Some(label) = decl.encoding().and_then(|label| label.ok()) else {
        return Ok(None);
    };

    // A declaration readable without a BOM rules out UTF-16
    Encoding::for_label(&label)
        .map(|encoding| Some(encoding.output_encoding()))
        .ok_or_else(|| {
            DocumentError::Encoding(format!(
                "unsupported encoding '{}'",
                String::from_utf8_lossy(&label)
            ))
        })
}

/// General entities declared in a DOCTYPE
#[derive(Debug, Default)]
struct Entities(HashMap<String, String>);

impl Entities {
    fn declare(&mut self, doctype: &[u8]) -> Result<(), DocumentError> {
        let re = Regex::new(r#"<!ENTITY\s+([^\s%"'<>]+)\s+(?:"([^"]*)"|'([^']*)')\s*>"#)
            .map_err(|e| DocumentError::InvalidContent {
                element: "DOCTYPE".to_string(),
                message: e.to_string(),
            })?;

        let subset = String::from_utf8_lossy(doctype);
        for cap in re.captures_iter(&subset) {
            let value = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
            // First declaration wins
            self.0
                .entry(cap[1].to_string())
                .or_insert_with(|| value.to_string());
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        resolve_predefined_entity(name).or_else(|| self.0.get(name).map(String::as_str))
    }
}

/// Parse the top-level node list of a document
pub(super) fn parse_nodes(input: &str) -> Result<Vec<Node>, DocumentError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().check_end_names = true;

    let mut top_level: Vec<Node> = Vec::new();
    let mut open: Vec<Element> = Vec::new();
    let mut entities = Entities::default();

    loop {
        let event = reader.read_event().map_err(|e| DocumentError::Malformed {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(start) => open.push(Element::open(start.into_owned(), &entities)?),
            Event::Empty(start) => {
                let element = Element::open(start.into_owned(), &entities)?;
                append(&mut open, &mut top_level, Node::Element(element));
            }
            Event::End(end) => {
                let mut element = open.pop().ok_or_else(|| DocumentError::Malformed {
                    position: reader.buffer_position() as u64,
                    message: "end tag without matching start tag".to_string(),
                })?;
                element.end = Some(end.into_owned());
                append(&mut open, &mut top_level, Node::Element(element));
            }
            Event::Text(text) => {
                let node = TextNode::parse(text.into_owned(), open.last(), &entities)?;
                append(&mut open, &mut top_level, Node::Text(node));
            }
            Event::DocType(doctype) => {
                entities.declare(&doctype)?;
                let node = Node::Markup(Event::DocType(doctype.into_owned()));
                append(&mut open, &mut top_level, node);
            }
            Event::Eof => break,
            other => append(&mut open, &mut top_level, Node::Markup(other.into_owned())),
        }
    }

    if let Some(element) = open.last() {
        return Err(DocumentError::Unclosed(element.name.clone()));
    }
    if !top_level.iter().any(|node| matches!(node, Node::Element(_))) {
        return Err(DocumentError::MissingRoot);
    }

    Ok(top_level)
}

fn append(open: &mut [Element], top_level: &mut Vec<Node>, node: Node) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top_level.push(node),
    }
}

impl Element {
    fn open(start: BytesStart<'static>, entities: &Entities) -> Result<Self, DocumentError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| DocumentError::Encoding(e.to_string()))?
            .to_string();

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| DocumentError::InvalidContent {
                element: name.clone(),
                message: e.to_string(),
            })?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|e| DocumentError::Encoding(e.to_string()))?
                .to_string();
            let value = attribute
                .unescape_value_with(|entity| entities.resolve(entity))
                .map_err(|e| DocumentError::InvalidContent {
                    element: name.clone(),
                    message: e.to_string(),
                })?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            start,
            name,
            attributes,
            children: Vec::new(),
            end: None,
        })
    }
}

impl TextNode {
    fn parse(
        raw: BytesText<'static>,
        parent: Option<&Element>,
        entities: &Entities,
    ) -> Result<Self, DocumentError> {
        let value = raw
            .unescape_with(|entity| entities.resolve(entity))
            .map_err(|e| DocumentError::InvalidContent {
                element: parent.map_or_else(|| "document".to_string(), |p| p.name.clone()),
                message: e.to_string(),
            })?
            .into_owned();
        Ok(Self { raw, value })
    }
}
