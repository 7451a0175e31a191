//! Tree serializer
//!
//! Untouched nodes are written from their original events, so the output is
//! byte-identical to the input apart from replaced text and the declaration.

use super::{Element, Node};
use crate::domain::DocumentError;
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;

const XML_VERSION: &str = "1.0";
const OUTPUT_ENCODING: &str = "UTF-8";

pub(super) fn write_nodes(nodes: &[Node]) -> Result<Vec<u8>, DocumentError> {
    let mut writer = Writer::new(Vec::new());

    let has_declaration = nodes
        .iter()
        .any(|node| matches!(node, Node::Markup(Event::Decl(_))));
    if !has_declaration {
        emit(
            &mut writer,
            Event::Decl(BytesDecl::new(XML_VERSION, Some(OUTPUT_ENCODING), None)),
        )?;
        emit(&mut writer, Event::Text(BytesText::from_escaped("\n")))?;
    }

    for node in nodes {
        write_node(&mut writer, node)?;
    }

    Ok(writer.into_inner())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), DocumentError> {
    match node {
        Node::Element(element) => write_element(writer, element),
        Node::Text(text) => emit(writer, Event::Text(text.raw.borrow())),
        Node::Markup(Event::Decl(decl)) => {
            let version = decl
                .version()
                .ok()
                .and_then(|v| String::from_utf8(v.into_owned()).ok())
                .unwrap_or_else(|| XML_VERSION.to_string());
            let standalone = decl
                .standalone()
                .and_then(|s| s.ok())
                .and_then(|s| String::from_utf8(s.into_owned()).ok());
            emit(
                writer,
                Event::Decl(BytesDecl::new(
                    &version,
                    Some(OUTPUT_ENCODING),
                    standalone.as_deref(),
                )),
            )
        }
        Node::Markup(event) => emit(writer, event.borrow()),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), DocumentError> {
    let Some(end) = &element.end else {
        return emit(writer, Event::Empty(element.start.borrow()));
    };

    emit(writer, Event::Start(element.start.borrow()))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    emit(writer, Event::End(end.borrow()))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), DocumentError> {
    writer
        .write_event(event)
        .map_err(|e| DocumentError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::document::Document;

    fn round_trip(input: &str) -> String {
        let document = Document::parse(input).unwrap();
        String::from_utf8(document.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_adds_declaration_when_missing() {
        assert_eq!(
            round_trip("<a>1</a>"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a>1</a>"
        );
    }

    #[test]
    fn test_rewrites_declaration_encoding() {
        let out = round_trip("<?xml version='1.0' encoding='iso-8859-1' standalone='yes'?><a/>");
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?><a/>"
        );
    }

    #[test]
    fn test_preserves_untouched_markup_verbatim() {
        let input = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<x12 a='single'  b=\"double\">\n",
            "  <!-- keep me -->\n",
            "  <?pi data?>\n",
            "  <seg id=\"N1\"><ele id=\"1\">A &amp; B</ele><![CDATA[<raw>]]><empty /></seg>\n",
            "</x12>\n"
        );
        assert_eq!(round_trip(input), input);
    }
}
