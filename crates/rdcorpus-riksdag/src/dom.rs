//! Index-addressed node arena for markup fragments
//!
//! html5ever builds a reference-counted tree; it is copied once into this
//! arena so that renaming, unwrapping and detaching are plain index
//! updates. Detached nodes stay in the vector but are unreachable from
//! the root.

use std::fmt::Write as _;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::document::{Block, ContentNode};

/// Element kinds the sanitizer distinguishes; everything else is `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Synthetic fragment root
    Root,
    Page,
    Paragraph,
    /// Generic container, unwrapped at the end
    Div,
    /// Marked for unwrapping (content kept)
    Discard,
    Other(String),
}

impl Tag {
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "page" => Self::Page,
            "p" => Self::Paragraph,
            "div" => Self::Div,
            _ => Self::Other(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Root => "text",
            Self::Page => "page",
            Self::Paragraph => "p",
            Self::Div => "div",
            Self::Discard => "kasta",
            Self::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub enum NodeData {
    Element {
        tag: Tag,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Empty arena holding only the root element.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Element {
                    tag: Tag::Root,
                    attrs: Vec::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Parse `markup` permissively and copy the content of its first
    /// `<text>` wrapper (or the whole document if there is none).
    ///
    /// Comments, processing instructions and doctypes are dropped.
    pub fn parse_html(markup: &str) -> Self {
        let rc = parse_document(RcDom::default(), Default::default()).one(markup);
        let start = find_element(&rc.document, "text").unwrap_or_else(|| rc.document.clone());

        let mut dom = Self::new();
        let root = dom.root();
        let mut stack: Vec<(Handle, NodeId)> = start
            .children
            .borrow()
            .iter()
            .rev()
            .map(|child| (child.clone(), root))
            .collect();

        while let Some((handle, parent)) = stack.pop() {
            match &handle.data {
                RcNodeData::Element { name, attrs, .. } => {
                    let attrs = attrs
                        .borrow()
                        .iter()
                        .map(|a| (a.name.local.to_string(), a.value.to_string()))
                        .collect();
                    let id = dom.append_element(parent, Tag::from_name(&name.local), attrs);
                    for child in handle.children.borrow().iter().rev() {
                        stack.push((child.clone(), id));
                    }
                }
                RcNodeData::Text { contents } => {
                    dom.append_text(parent, contents.borrow().to_string());
                }
                RcNodeData::Document => {
                    for child in handle.children.borrow().iter().rev() {
                        stack.push((child.clone(), parent));
                    }
                }
                RcNodeData::Doctype { .. }
                | RcNodeData::Comment { .. }
                | RcNodeData::ProcessingInstruction { .. } => {}
            }
        }
        dom
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: Tag,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        self.push(parent, NodeData::Element { tag, attrs })
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.push(parent, NodeData::Text(text.into()))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn tag(&self, id: NodeId) -> Option<&Tag> {
        match &self.nodes[id.0].data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    pub fn set_tag(&mut self, id: NodeId, new_tag: Tag) {
        if let NodeData::Element { tag, .. } = &mut self.nodes[id.0].data {
            *tag = new_tag;
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// Mutable attribute list; `None` for text nodes.
    pub fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Vec<(String, String)>> {
        match &mut self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => Some(attrs),
            NodeData::Text(_) => None,
        }
    }

    /// Attached nodes below `id` in document order (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Attached elements below the root in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&id| self.tag(id).is_some())
            .collect()
    }

    pub fn has_descendant_tag(&self, id: NodeId, wanted: &Tag) -> bool {
        self.descendants(id)
            .into_iter()
            .any(|d| self.tag(d) == Some(wanted))
    }

    /// Total characters in text nodes below `id`.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.descendants(id)
            .into_iter()
            .map(|d| match &self.nodes[d.0].data {
                NodeData::Text(t) => t.chars().count(),
                NodeData::Element { .. } => 0,
            })
            .sum()
    }

    /// Remove `id` (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Replace `id` by its children in its parent's child list.
    pub fn unwrap(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for &child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.0].children;
        if let Some(pos) = siblings.iter().position(|&c| c == id) {
            siblings.splice(pos..=pos, children);
        }
    }

    /// Merge runs of adjacent text nodes below `id` into one node each.
    pub fn merge_adjacent_text(&mut self, id: NodeId) {
        let mut elements = vec![id];
        elements.extend(
            self.descendants(id)
                .into_iter()
                .filter(|&d| self.tag(d).is_some()),
        );

        for el in elements {
            let children = std::mem::take(&mut self.nodes[el.0].children);
            let mut merged: Vec<NodeId> = Vec::with_capacity(children.len());
            for child in children {
                let prev_text = merged
                    .last()
                    .copied()
                    .filter(|&p| matches!(self.nodes[p.0].data, NodeData::Text(_)));
                match (prev_text, &self.nodes[child.0].data) {
                    (Some(prev), NodeData::Text(t)) => {
                        let t = t.clone();
                        if let NodeData::Text(acc) = &mut self.nodes[prev.0].data {
                            acc.push_str(&t);
                        }
                        self.nodes[child.0].parent = None;
                    }
                    _ => merged.push(child),
                }
            }
            self.nodes[el.0].children = merged;
        }
    }

    /// Owned content below the root: `page`/`p` elements and text.
    ///
    /// Any other element kind is flattened into its parent.
    pub fn to_content(&self) -> Vec<ContentNode> {
        self.content_of(self.root())
    }

    fn content_of(&self, id: NodeId) -> Vec<ContentNode> {
        let mut out = Vec::new();
        for &child in self.children(id) {
            match &self.nodes[child.0].data {
                NodeData::Text(t) => out.push(ContentNode::Text(t.clone())),
                NodeData::Element { tag, attrs } => {
                    let block = match tag {
                        Tag::Page => Block::Page,
                        Tag::Paragraph => Block::Paragraph,
                        _ => {
                            out.extend(self.content_of(child));
                            continue;
                        }
                    };
                    out.push(ContentNode::Element {
                        block,
                        attrs: attrs.clone(),
                        children: self.content_of(child),
                    });
                }
            }
        }
        out
    }

    /// Debug rendering of the attached tree as markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.render(self.root(), &mut out);
        out
    }

    fn render(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Text(t) => out.push_str(&quick_xml::escape::escape(t.as_str())),
            NodeData::Element { tag, attrs } => {
                let _ = write!(out, "<{}", tag.name());
                for (k, v) in attrs {
                    let _ = write!(out, " {}=\"{}\"", k, quick_xml::escape::escape(v.as_str()));
                }
                out.push('>');
                for &child in self.children(id) {
                    self.render(child, out);
                }
                let _ = write!(out, "</{}>", tag.name());
            }
        }
    }
}

fn find_element(handle: &Handle, wanted: &str) -> Option<Handle> {
    let mut stack = vec![handle.clone()];
    while let Some(node) = stack.pop() {
        if let RcNodeData::Element { name, .. } = &node.data {
            if &*name.local == wanted {
                return Some(node);
            }
        }
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(dom: &Dom, id: NodeId) -> String {
        let mut out = String::new();
        for d in dom.descendants(id) {
            if let NodeData::Text(t) = dom.data(d) {
                out.push_str(t);
            }
        }
        out
    }

    #[test]
    fn parses_wrapped_fragment_below_root() {
        let dom = Dom::parse_html("<text><p>Hej <b>då</b></p></text>");
        let root = dom.root();
        assert_eq!(dom.children(root).len(), 1);
        let p = dom.children(root)[0];
        assert_eq!(dom.tag(p), Some(&Tag::Paragraph));
        assert_eq!(text_of(&dom, root), "Hej då");
        assert_eq!(dom.text_len(root), 6);
    }

    #[test]
    fn comments_are_dropped() {
        let dom = Dom::parse_html("<text>a<!-- hidden -->b</text>");
        assert_eq!(text_of(&dom, dom.root()), "ab");
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        assert_eq!(Tag::from_name("DIV"), Tag::Div);
        assert_eq!(Tag::from_name("P"), Tag::Paragraph);
        assert_eq!(Tag::from_name("INGENBILD"), Tag::Other("ingenbild".into()));
    }

    #[test]
    fn unwrap_reparents_children_in_place() {
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_text(root, "a");
        let span = dom.append_element(root, Tag::Other("span".into()), vec![]);
        dom.append_text(span, "b");
        let inner = dom.append_element(span, Tag::Paragraph, vec![]);
        dom.append_text(root, "c");

        dom.unwrap(span);
        let kids = dom.children(root).to_vec();
        assert_eq!(kids.len(), 4);
        assert_eq!(kids[2], inner);
        assert_eq!(text_of(&dom, root), "abc");
    }

    #[test]
    fn merge_adjacent_text_joins_runs() {
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_text(root, "a");
        dom.append_text(root, " ");
        dom.append_text(root, "b");
        dom.merge_adjacent_text(root);
        assert_eq!(dom.children(root).len(), 1);
        assert_eq!(text_of(&dom, root), "a b");
    }

    #[test]
    fn detach_hides_subtree() {
        let mut dom = Dom::new();
        let root = dom.root();
        let style = dom.append_element(root, Tag::Other("style".into()), vec![]);
        dom.append_text(style, "p { color: red }");
        dom.detach(style);
        assert_eq!(dom.text_len(root), 0);
        assert!(dom.elements().is_empty());
    }

    #[test]
    fn content_flattens_unknown_elements() {
        let mut dom = Dom::new();
        let root = dom.root();
        let p = dom.append_element(root, Tag::Paragraph, vec![]);
        let b = dom.append_element(p, Tag::Other("b".into()), vec![]);
        dom.append_text(b, "x");

        let content = dom.to_content();
        assert_eq!(
            content,
            vec![ContentNode::Element {
                block: Block::Paragraph,
                attrs: vec![],
                children: vec![ContentNode::Text("x".into())],
            }]
        );
    }
}
