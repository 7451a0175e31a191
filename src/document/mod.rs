//! XML document model
//!
//! A lossless tree over `quick-xml` events. Markup the engines never touch is
//! kept as the original event and written back verbatim; only field text that
//! has been replaced is re-escaped on output.
//!
//! # Structure
//!
//! The engines see two kinds of element, both selected by a [`DocumentSchema`]:
//!
//! - **group** elements (`<loop id="2010BA">`), which scope rule lookups, and
//! - **field** elements (`<ele id="NM103">`), whose leading text is the value
//!   that gets masked or restored.
//!
//! The leading text is every text and CDATA node before the first child
//! element, joined. Comments and processing instructions in that run are
//! skipped and kept in place when the text is replaced.
//!
//! A field belongs to its nearest enclosing group at any depth, so the usual
//! `loop > seg > ele` nesting needs no special handling.
//!
//! ```
//! use phimask::document::{Document, DocumentSchema};
//!
//! let xml = r#"<x12><loop id="N1"><seg id="N1"><ele id="1035">Alice</ele></seg></loop></x12>"#;
//! let document = Document::parse(xml).unwrap();
//! let fields = document.fields(&DocumentSchema::default());
//!
//! assert_eq!(fields[0].group_id.as_deref(), Some("N1"));
//! assert_eq!(fields[0].field_id.as_deref(), Some("1035"));
//! assert_eq!(fields[0].text.as_deref(), Some("Alice"));
//! ```

mod parser;
mod writer;

use crate::config::DocumentConfig;
use crate::domain::{DocumentError, PhimaskError, Result};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use std::borrow::Cow;
use std::path::Path;

/// Tag and attribute names that identify groups and fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSchema {
    /// Element name of group nodes
    pub group_tag: String,
    /// Element names of field nodes
    pub field_tags: Vec<String>,
    /// Attribute carrying the group or field identifier
    pub id_attribute: String,
}

impl DocumentSchema {
    /// Create a schema from explicit names
    pub fn new(
        group_tag: impl Into<String>,
        field_tags: Vec<String>,
        id_attribute: impl Into<String>,
    ) -> Self {
        Self {
            group_tag: group_tag.into(),
            field_tags,
            id_attribute: id_attribute.into(),
        }
    }

    fn is_field(&self, name: &str) -> bool {
        self.field_tags.iter().any(|tag| tag == name)
    }
}

impl Default for DocumentSchema {
    /// The pyx12 XML rendering of X12: `<loop id>`, `<ele id>`
    fn default() -> Self {
        Self::new("loop", vec!["ele".to_string()], "id")
    }
}

impl From<&DocumentConfig> for DocumentSchema {
    fn from(config: &DocumentConfig) -> Self {
        Self::new(
            config.group_tag.clone(),
            config.field_tags.clone(),
            config.id_attribute.clone(),
        )
    }
}

/// A parsed XML document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

/// A node in the document tree
#[derive(Debug, Clone)]
pub enum Node {
    /// Element with its children
    Element(Element),
    /// Character data between markup
    Text(TextNode),
    /// Declaration, comment, CDATA, processing instruction or doctype
    Markup(Event<'static>),
}

/// An XML element
#[derive(Debug, Clone)]
pub struct Element {
    start: BytesStart<'static>,
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    /// `None` for a self-closing element
    end: Option<BytesEnd<'static>>,
}

/// Character data with its original escaped form
#[derive(Debug, Clone)]
pub struct TextNode {
    raw: BytesText<'static>,
    value: String,
}

/// Read-only view of a field, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    /// Identifier of the nearest enclosing group, if any
    pub group_id: Option<String>,
    /// Identifier of the field
    pub field_id: Option<String>,
    /// Leading text of the field
    pub text: Option<String>,
}

/// Mutable access to one field during traversal
pub struct FieldSlot<'a> {
    group_id: Option<&'a str>,
    field_id: Option<&'a str>,
    element_name: &'a str,
    children: &'a mut Vec<Node>,
    end: &'a mut Option<BytesEnd<'static>>,
}

impl Document {
    /// Parse a document from a string
    pub fn parse(input: &str) -> std::result::Result<Self, DocumentError> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        let nodes = parser::parse_nodes(input)?;
        Ok(Self { nodes })
    }

    /// Parse a document from bytes
    ///
    /// The encoding comes from a byte order mark, then from the XML
    /// declaration, and defaults to UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, DocumentError> {
        let input = parser::decode_input(bytes)?;
        Self::parse(&input)
    }

    /// Read and parse a document from disk
    ///
    /// # Errors
    ///
    /// Returns [`PhimaskError::DocumentParse`] if the file cannot be read or
    /// is not well-formed.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let parse_error = |source| PhimaskError::DocumentParse {
            path: path.display().to_string(),
            source,
        };

        let bytes = std::fs::read(path).map_err(|e| parse_error(DocumentError::Io(e.to_string())))?;
        Self::from_bytes(&bytes).map_err(parse_error)
    }

    /// Serialize the document
    ///
    /// The output always starts with a UTF-8 XML declaration.
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, DocumentError> {
        writer::write_nodes(&self.nodes)
    }

    /// Serialize the document to disk, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns [`PhimaskError::DocumentWrite`] if serialization or the write fails.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write_error = |reason: String| PhimaskError::DocumentWrite {
            path: path.display().to_string(),
            reason,
        };

        let bytes = self.to_bytes().map_err(|e| write_error(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
        }
        std::fs::write(path, bytes).map_err(|e| write_error(e.to_string()))
    }

    /// The root element
    pub fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Snapshot of every field in document order
    pub fn fields(&self, schema: &DocumentSchema) -> Vec<FieldValue> {
        let mut fields = Vec::new();
        collect_fields(&self.nodes, schema, None, &mut fields);
        fields
    }

    /// Visit every field in pre-order, children in source order
    ///
    /// The visitor receives each field together with the identifier of its
    /// nearest enclosing group. Traversal stops at the first error.
    pub fn visit_fields_mut<E, F>(&mut self, schema: &DocumentSchema, mut visit: F) -> std::result::Result<(), E>
    where
        F: FnMut(&mut FieldSlot<'_>) -> std::result::Result<(), E>,
    {
        walk_fields(&mut self.nodes, schema, None, &mut visit)
    }
}

fn walk_fields<E, F>(
    nodes: &mut [Node],
    schema: &DocumentSchema,
    group_id: Option<&str>,
    visit: &mut F,
) -> std::result::Result<(), E>
where
    F: FnMut(&mut FieldSlot<'_>) -> std::result::Result<(), E>,
{
    for node in nodes.iter_mut() {
        let Node::Element(element) = node else {
            continue;
        };
        let Element {
            name,
            attributes,
            children,
            end,
            ..
        } = element;
        let own_id = attribute_value(attributes, &schema.id_attribute);

        if *name == schema.group_tag {
            walk_fields(children, schema, own_id, visit)?;
            continue;
        }

        if schema.is_field(name) {
            let mut slot = FieldSlot {
                group_id,
                field_id: own_id,
                element_name: name,
                children: &mut *children,
                end: &mut *end,
            };
            visit(&mut slot)?;
        }
        walk_fields(children, schema, group_id, visit)?;
    }
    Ok(())
}

fn collect_fields(
    nodes: &[Node],
    schema: &DocumentSchema,
    group_id: Option<&str>,
    out: &mut Vec<FieldValue>,
) {
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };
        let own_id = element.attribute(&schema.id_attribute);

        if element.name == schema.group_tag {
            collect_fields(&element.children, schema, own_id, out);
            continue;
        }

        if schema.is_field(&element.name) {
            out.push(FieldValue {
                group_id: group_id.map(str::to_string),
                field_id: own_id.map(str::to_string),
                text: leading_text(&element.children).map(Cow::into_owned),
            });
        }
        collect_fields(&element.children, schema, group_id, out);
    }
}

fn attribute_value<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// Length of the run of text, CDATA, comments and processing instructions
/// that opens `children`
fn leading_run_len(children: &[Node]) -> usize {
    children
        .iter()
        .position(|node| {
            !matches!(
                node,
                Node::Text(_)
                    | Node::Markup(Event::CData(_) | Event::Comment(_) | Event::PI(_))
            )
        })
        .unwrap_or(children.len())
}

fn text_piece(node: &Node) -> Option<Cow<'_, str>> {
    match node {
        Node::Text(text) => Some(Cow::Borrowed(text.value())),
        Node::Markup(Event::CData(cdata)) => Some(String::from_utf8_lossy(cdata)),
        _ => None,
    }
}

fn leading_text(children: &[Node]) -> Option<Cow<'_, str>> {
    children[..leading_run_len(children)]
        .iter()
        .filter_map(text_piece)
        .reduce(|joined, piece| Cow::Owned(joined.into_owned() + &*piece))
}

impl Element {
    /// Element name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unescaped attribute value
    pub fn attribute(&self, key: &str) -> Option<&str> {
        attribute_value(&self.attributes, key)
    }

    /// Child nodes in source order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Leading text content
    pub fn text(&self) -> Option<Cow<'_, str>> {
        leading_text(&self.children)
    }
}

impl TextNode {
    /// Text created from an unescaped value
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let escaped = partial_escape(value.as_str()).into_owned();
        Self {
            raw: BytesText::from_escaped(escaped),
            value,
        }
    }

    /// Unescaped text
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FieldSlot<'_> {
    /// Identifier of the nearest enclosing group
    pub fn group_id(&self) -> Option<&str> {
        self.group_id
    }

    /// Identifier of this field
    pub fn field_id(&self) -> Option<&str> {
        self.field_id
    }

    /// Element name of this field
    pub fn element_name(&self) -> &str {
        self.element_name
    }

    /// Leading text content
    pub fn text(&self) -> Option<Cow<'_, str>> {
        leading_text(self.children)
    }

    /// Replace the leading text content
    ///
    /// The new value takes the place of the first text or CDATA node and
    /// keeps its kind, unless it cannot be written as CDATA. A self-closing
    /// field is expanded into a start/end pair.
    pub fn set_text(&mut self, value: impl Into<String>) {
        let value = value.into();
        let run = leading_run_len(self.children);
        let first = self.children[..run]
            .iter()
            .position(|node| text_piece(node).is_some());

        let in_cdata = first.is_some_and(|i| {
            matches!(self.children[i], Node::Markup(Event::CData(_)))
        });
        let node = if in_cdata && !value.contains("]]>") {
            Node::Markup(Event::CData(BytesCData::new(value)))
        } else {
            Node::Text(TextNode::new(value))
        };

        let mut index = 0;
        self.children.retain(|child| {
            let keep = index >= run || text_piece(child).is_none();
            index += 1;
            keep
        });
        self.children.insert(first.unwrap_or(0), node);

        if self.end.is_none() {
            *self.end = Some(BytesEnd::new(self.element_name.to_string()));
        }
    }
}
