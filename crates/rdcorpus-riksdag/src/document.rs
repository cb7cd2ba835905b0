//! NormalizedDocument model and its XML serialization

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::ExtractError;

/// Root element of one normalized document.
pub const ROOT_TAG: &str = "dokument";
/// Element of one text segment.
pub const SEGMENT_TAG: &str = "text";
/// Segment attribute carrying the segment kind.
pub const KIND_ATTR: &str = "datatyp";
/// Kind of the segment built from the record's main markup.
pub const MAIN_KIND: &str = "huvuddokument";

/// Structural elements allowed inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    Page,
    Paragraph,
}

impl Block {
    pub fn tag_name(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Paragraph => "p",
        }
    }
}

/// Sanitized segment content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    Text(String),
    Element {
        block: Block,
        attrs: Vec<(String, String)>,
        children: Vec<ContentNode>,
    },
}

impl ContentNode {
    /// Characters of text in this node and below.
    pub fn text_len(&self) -> usize {
        match self {
            Self::Text(t) => t.chars().count(),
            Self::Element { children, .. } => children.iter().map(Self::text_len).sum(),
        }
    }
}

/// Ordered attribute list; setting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|(k, _)| k == name)?;
        Some(self.0.remove(pos).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One unit of extracted text with its kind and scalar metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub kind: String,
    pub attrs: Attributes,
    pub content: Vec<ContentNode>,
}

impl TextSegment {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Attributes::default(),
            content: Vec::new(),
        }
    }

    /// Segment for the record's main markup.
    pub fn main() -> Self {
        Self::new(MAIN_KIND)
    }

    pub fn is_main(&self) -> bool {
        self.kind == MAIN_KIND
    }

    pub fn text_len(&self) -> usize {
        self.content.iter().map(ContentNode::text_len).sum()
    }
}

/// Output entity: document-level attributes plus text segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub attrs: Attributes,
    pub segments: Vec<TextSegment>,
}

impl NormalizedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main_segment_mut(&mut self) -> Option<&mut TextSegment> {
        self.segments.iter_mut().find(|s| s.is_main())
    }

    /// Whether any segment renders at least one character.
    pub fn has_text(&self) -> bool {
        self.segments.iter().any(|s| s.text_len() > 0)
    }

    /// Serialize as indented XML without declaration.
    pub fn to_xml(&self) -> Result<Vec<u8>, ExtractError> {
        let mut writer = Writer::new(Vec::new());
        let root = BytesStart::new(ROOT_TAG).with_attributes(self.attrs.iter());
        writer.write_event(Event::Start(root))?;

        for segment in &self.segments {
            newline(&mut writer, 1);
            let start = BytesStart::new(SEGMENT_TAG)
                .with_attributes([(KIND_ATTR, segment.kind.as_str())])
                .with_attributes(segment.attrs.iter());
            if segment.content.is_empty() {
                writer.write_event(Event::Empty(start))?;
                continue;
            }
            writer.write_event(Event::Start(start))?;
            write_content(&mut writer, &segment.content, 2)?;
            writer.write_event(Event::End(BytesEnd::new(SEGMENT_TAG)))?;
        }

        newline(&mut writer, 0);
        writer.write_event(Event::End(BytesEnd::new(ROOT_TAG)))?;
        Ok(writer.into_inner())
    }
}

const INDENT: usize = 2;

fn newline(writer: &mut Writer<Vec<u8>>, depth: usize) {
    let out = writer.get_mut();
    out.push(b'\n');
    out.resize(out.len() + depth * INDENT, b' ');
}

/// Children go on their own lines only when none of them is text; mixed
/// content is written as is.
fn write_content(
    writer: &mut Writer<Vec<u8>>,
    nodes: &[ContentNode],
    depth: usize,
) -> std::io::Result<()> {
    let indent = !nodes.iter().any(|n| matches!(n, ContentNode::Text(_)));
    for node in nodes {
        if indent {
            newline(writer, depth);
        }
        match node {
            ContentNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            ContentNode::Element {
                block,
                attrs,
                children,
            } => {
                let start = BytesStart::new(block.tag_name())
                    .with_attributes(attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                if children.is_empty() {
                    writer.write_event(Event::Empty(start))?;
                    continue;
                }
                writer.write_event(Event::Start(start))?;
                write_content(writer, children, depth + 1)?;
                writer.write_event(Event::End(BytesEnd::new(block.tag_name())))?;
            }
        }
    }
    if indent {
        newline(writer, depth.saturating_sub(1));
    }
    Ok(())
}
