//! DocumentRecord parser using quick-xml
//!
//! Builds a small owned element tree from one archive entry. Record
//! payloads are element-only; XML attributes, comments and processing
//! instructions are not kept.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ExtractError;

const BOM: char = '\u{feff}';

/// One element of a raw document record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordNode {
    pub tag: String,
    /// Text before the first child element
    pub text: Option<String>,
    pub children: Vec<RecordNode>,
}

impl RecordNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: None,
            children: Vec::new(),
        }
    }

    /// First direct child named `tag`.
    pub fn child(&self, tag: &str) -> Option<&RecordNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Text of the first direct child named `tag`.
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.child(tag).and_then(|c| c.text.as_deref())
    }

    /// Whether the element carries text that is not only whitespace.
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

fn start_node(e: &BytesStart<'_>) -> RecordNode {
    RecordNode::new(String::from_utf8_lossy(e.name().as_ref()).into_owned())
}

fn push_text(stack: &mut [RecordNode], text: &str) {
    if let Some(node) = stack.last_mut() {
        if node.children.is_empty() {
            node.text.get_or_insert_with(String::new).push_str(text);
        }
    }
}

fn attach(stack: &mut [RecordNode], node: RecordNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Parse one entry payload into its root element.
///
/// A leading byte order mark is ignored.
pub fn parse_record(bytes: &[u8]) -> Result<RecordNode, ExtractError> {
    let text = std::str::from_utf8(bytes).map_err(ExtractError::Encoding)?;
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut reader = Reader::from_str(text);
    // Bottom of the stack collects top-level elements
    let mut stack = vec![RecordNode::default()];

    loop {
        let event = reader.read_event().map_err(|e| ExtractError::Xml {
            position: reader.error_position(),
            message: e.to_string(),
        })?;
        match event {
            Event::Start(e) => stack.push(start_node(&e)),
            Event::Empty(e) => attach(&mut stack, start_node(&e)),
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(ExtractError::Xml {
                        position: reader.buffer_position(),
                        message: "unbalanced end tag".into(),
                    });
                }
                if let Some(node) = stack.pop() {
                    attach(&mut stack, node);
                }
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|err| ExtractError::Xml {
                    position: reader.buffer_position(),
                    message: err.to_string(),
                })?;
                push_text(&mut stack, &text);
            }
            Event::CData(e) => push_text(&mut stack, &String::from_utf8_lossy(&e)),
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(ExtractError::Xml {
            position: reader.buffer_position(),
            message: format!("{} unclosed element(s)", stack.len() - 1),
        });
    }
    stack
        .pop()
        .and_then(|doc| doc.children.into_iter().next())
        .ok_or_else(|| ExtractError::Xml {
            position: 0,
            message: "no root element".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_text() {
        let xml = "<dokumentstatus><dokument><dok_id>H501</dok_id><html>&lt;p&gt;x&lt;/p&gt;</html></dokument></dokumentstatus>";
        let root = parse_record(xml.as_bytes()).unwrap();
        assert_eq!(root.tag, "dokumentstatus");
        let doc = root.child("dokument").unwrap();
        assert_eq!(doc.child_text("dok_id"), Some("H501"));
        assert_eq!(doc.child_text("html"), Some("<p>x</p>"));
    }

    #[test]
    fn strips_bom_and_declaration() {
        let xml = "\u{feff}<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<a><b/></a>";
        let root = parse_record(xml.as_bytes()).unwrap();
        assert_eq!(root.tag, "a");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].text, None);
    }

    #[test]
    fn comments_are_skipped_and_cdata_is_text() {
        let xml = "<a><!-- note --><b><![CDATA[<p>raw</p>]]></b></a>";
        let root = parse_record(xml.as_bytes()).unwrap();
        assert_eq!(root.child_text("b"), Some("<p>raw</p>"));
    }

    #[test]
    fn text_after_first_child_is_not_element_text() {
        let root = parse_record(b"<a>lead<b>x</b>tail</a>").unwrap();
        assert_eq!(root.text.as_deref(), Some("lead"));
    }

    #[test]
    fn blank_text_does_not_count() {
        let root = parse_record(b"<a>\n   </a>").unwrap();
        assert!(!root.has_text());
    }

    #[test]
    fn mismatched_tags_are_xml_errors() {
        let err = parse_record(b"<a><b></a>").unwrap_err();
        assert!(matches!(err, ExtractError::Xml { .. }));
    }

    #[test]
    fn truncated_document_is_xml_error() {
        let err = parse_record(b"<a><b>text</b>").unwrap_err();
        assert!(matches!(err, ExtractError::Xml { .. }));
    }

    #[test]
    fn invalid_utf8_is_encoding_error() {
        let err = parse_record(&[b'<', b'a', b'>', 0xff, b'<', b'/', b'a', b'>']).unwrap_err();
        assert!(matches!(err, ExtractError::Encoding(_)));
    }
}
