//! Structural reduction of a cleaned markup fragment to `page` / `p` / text

use rustc_hash::FxHashSet;

use crate::document::ContentNode;
use crate::dom::{Dom, NodeData, NodeId, Tag};

/// Attributes removed from every element before anything else.
const BLOCKED_ATTRIBUTES: &[&str] = &[
    "style",
    "class",
    "cellpadding",
    "cellspacing",
    "colspan",
    "align",
    "valign",
    "name",
    "rowspan",
    "images",
];

/// Elements deleted together with their content.
const DELETED_ELEMENTS: &[&str] = &["style", "meta", "ingenbild", "script"];

/// Inline or structural wrappers dropped while their content is kept.
const STRIPPED_TAGS: &[&str] = &[
    "table",
    "thead",
    "tbody",
    "form",
    "caption",
    "a",
    "link",
    "span",
    "em",
    "strong",
    "sub",
    "sup",
    "b",
    "i",
    "u",
    "nobr",
    "ul",
    "ol",
    "colgroup",
    "col",
    "tt",
    "dir",
    "del",
    "ins",
    "s",
    "label",
    "pre",
    "spanstyle",
    "metricconverterproductid",
    "spanclass",
    "bstyle",
    "istyle",
    "brclear",
    "brstyle",
    "comment",
    "img",
    "hr",
    "fontsize",
    "aname",
    "metricconverter",
    "astyle",
    "personname",
    "spanlang",
    "date",
    "font",
    "fontcolor",
    "ahref",
    "textovervagande",
    "rubrikavvikandemening",
];

/// Block-ish elements that become paragraphs.
const PARAGRAPH_LIKE: &[&str] = &[
    "title", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th",
];

const PAGE_ID_PREFIX: &str = "page_";

/// What the sanitizer had to give up on, for one fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Characters in text nodes before any structural reduction
    pub original_len: usize,
    /// Characters in text nodes after the allowlist pass
    pub final_len: usize,
    /// Tag names outside the allowed vocabulary, sorted
    pub forbidden_tags: Vec<String>,
}

impl SanitizeReport {
    /// Characters lost between the first and the second length check.
    pub fn lost_chars(&self) -> isize {
        self.original_len as isize - self.final_len as isize
    }
}

/// Outcome of [`sanitize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sanitized {
    Content {
        content: Vec<ContentNode>,
        report: SanitizeReport,
        /// Tree as parsed, before reduction (debug mode only)
        snapshot: Option<String>,
    },
    /// No visible text; the segment must be dropped
    Empty,
}

impl Sanitized {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Parse `cleaned` and reduce it to the allowed vocabulary.
///
/// `filename` only labels diagnostics. With `debug` set, the parsed tree
/// is rendered into [`Sanitized::Content::snapshot`] before reduction.
pub fn sanitize(cleaned: &str, filename: &str, debug: bool) -> Sanitized {
    let mut dom = Dom::parse_html(&format!("<text>{cleaned}</text>"));

    strip_attributes(&mut dom);
    delete_elements(&mut dom);

    let original_len = dom.text_len(dom.root());
    if original_len == 0 {
        log::debug!("No content in {filename}");
        return Sanitized::Empty;
    }
    let snapshot = debug.then(|| dom.to_markup());

    strip_inline_tags(&mut dom);
    mark_pages(&mut dom);
    mark_paragraphs(&mut dom);
    flatten_nesting(&mut dom);
    let forbidden_tags = reduce_to_allowlist(&mut dom);
    if !forbidden_tags.is_empty() {
        log::warn!(
            "Removed forbidden tags from {filename}: {}",
            forbidden_tags.join(", ")
        );
    }

    let final_len = dom.text_len(dom.root());
    let report = SanitizeReport {
        original_len,
        final_len,
        forbidden_tags,
    };
    if report.lost_chars() != 0 {
        log::warn!(
            "Contents were lost in {filename} ({} chars missing)",
            report.lost_chars()
        );
    }
    if final_len == 0 {
        log::debug!("No content in {filename}");
        return Sanitized::Empty;
    }

    drop_blank_text(&mut dom);
    drop_empty_elements(&mut dom);

    let content = dom.to_content();
    if content.is_empty() {
        log::debug!("Only whitespace in {filename}");
        return Sanitized::Empty;
    }
    Sanitized::Content {
        content,
        report,
        snapshot,
    }
}

fn tagged(dom: &Dom, names: &[&str]) -> Vec<NodeId> {
    dom.elements()
        .into_iter()
        .filter(|&id| dom.tag(id).is_some_and(|t| names.contains(&t.name())))
        .collect()
}

fn strip_attributes(dom: &mut Dom) {
    for id in dom.elements() {
        if let Some(attrs) = dom.attrs_mut(id) {
            attrs.retain(|(k, _)| !BLOCKED_ATTRIBUTES.contains(&k.as_str()));
        }
    }
}

fn delete_elements(dom: &mut Dom) {
    for id in tagged(dom, DELETED_ELEMENTS) {
        dom.detach(id);
    }
}

fn strip_inline_tags(dom: &mut Dom) {
    for id in tagged(dom, STRIPPED_TAGS) {
        dom.unwrap(id);
    }
}

/// `<div id="page_N">` becomes `<page id="N">`.
fn mark_pages(dom: &mut Dom) {
    for id in dom.elements() {
        if dom.tag(id) != Some(&Tag::Div) {
            continue;
        }
        let Some(page) = dom
            .attr(id, "id")
            .and_then(|v| v.strip_prefix(PAGE_ID_PREFIX))
            .map(str::to_owned)
        else {
            continue;
        };
        dom.set_tag(id, Tag::Page);
        if let Some(attrs) = dom.attrs_mut(id) {
            for (k, v) in attrs.iter_mut() {
                if k == "id" {
                    *v = page.clone();
                }
            }
        }
    }
}

fn mark_paragraphs(dom: &mut Dom) {
    for id in tagged(dom, PARAGRAPH_LIKE) {
        dom.set_tag(id, Tag::Paragraph);
    }
}

/// Outer pages around pages and outer paragraphs around paragraphs are
/// discarded; surviving paragraphs lose all attributes.
fn flatten_nesting(dom: &mut Dom) {
    for tag in [Tag::Page, Tag::Paragraph] {
        let outer: Vec<NodeId> = dom
            .elements()
            .into_iter()
            .filter(|&id| dom.tag(id) == Some(&tag) && dom.has_descendant_tag(id, &tag))
            .collect();
        for id in outer {
            dom.set_tag(id, Tag::Discard);
        }
    }
    for id in dom.elements() {
        if dom.tag(id) == Some(&Tag::Paragraph) {
            if let Some(attrs) = dom.attrs_mut(id) {
                attrs.clear();
            }
        }
    }
}

/// Retag everything outside the vocabulary, then unwrap discarded
/// elements and generic containers. Returns the forbidden tag names.
fn reduce_to_allowlist(dom: &mut Dom) -> Vec<String> {
    let mut forbidden = FxHashSet::default();
    for id in dom.elements() {
        let Some(tag) = dom.tag(id) else { continue };
        if !matches!(tag, Tag::Discard | Tag::Div | Tag::Page | Tag::Paragraph) {
            forbidden.insert(tag.name().to_owned());
            dom.set_tag(id, Tag::Discard);
        }
    }
    for id in dom.elements() {
        if matches!(dom.tag(id), Some(Tag::Discard | Tag::Div)) {
            dom.unwrap(id);
        }
    }

    let mut forbidden: Vec<String> = forbidden.into_iter().collect();
    forbidden.sort_unstable();
    forbidden
}

fn drop_blank_text(dom: &mut Dom) {
    let root = dom.root();
    dom.merge_adjacent_text(root);
    let blank: Vec<NodeId> = dom
        .descendants(root)
        .into_iter()
        .filter(|&id| matches!(dom.data(id), NodeData::Text(t) if t.trim().is_empty()))
        .collect();
    for id in blank {
        dom.detach(id);
    }
}

/// Children are visited before their parents, so emptiness propagates up.
fn drop_empty_elements(dom: &mut Dom) {
    for id in dom.elements().into_iter().rev() {
        if dom.children(id).is_empty() {
            dom.detach(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Block;

    fn content(markup: &str) -> (Vec<ContentNode>, SanitizeReport) {
        match sanitize(markup, "test.xml", false) {
            Sanitized::Content {
                content, report, ..
            } => (content, report),
            Sanitized::Empty => panic!("expected content for {markup:?}"),
        }
    }

    fn p(text: &str) -> ContentNode {
        ContentNode::Element {
            block: Block::Paragraph,
            attrs: vec![],
            children: vec![ContentNode::Text(text.into())],
        }
    }

    fn assert_closed(nodes: &[ContentNode]) {
        for node in nodes {
            if let ContentNode::Element {
                block, children, ..
            } = node
            {
                assert!(matches!(block, Block::Page | Block::Paragraph));
                assert_closed(children);
            }
        }
    }

    #[test]
    fn page_divs_become_pages() {
        let (nodes, report) = content(r#"<div id="page_3"><p class="x">Hello</p></div>"#);
        assert_eq!(
            nodes,
            vec![ContentNode::Element {
                block: Block::Page,
                attrs: vec![("id".into(), "3".into())],
                children: vec![p("Hello")],
            }]
        );
        assert_eq!(report.lost_chars(), 0);
    }

    #[test]
    fn inline_formatting_is_unwrapped() {
        let (nodes, report) = content("<p>Hej <b>du</b> <span>där</span></p>");
        assert_eq!(nodes, vec![p("Hej du där")]);
        assert!(report.forbidden_tags.is_empty());
    }

    #[test]
    fn deleted_elements_do_not_count() {
        let (nodes, report) = content("<style>p{}</style><p>Text</p><script>x()</script>");
        assert_eq!(nodes, vec![p("Text")]);
        assert_eq!(report.original_len, 4);
        assert_eq!(report.final_len, 4);
    }

    #[test]
    fn fragment_without_text_is_empty() {
        assert!(sanitize("<style>p{}</style>", "t", false).is_empty());
        assert!(sanitize("", "t", false).is_empty());
    }

    #[test]
    fn whitespace_only_fragment_is_empty() {
        assert!(sanitize("<p>  </p>\n<div> </div>", "t", false).is_empty());
    }

    #[test]
    fn nested_pages_keep_innermost() {
        let (nodes, _) = content(r#"<div id="page_1"><div id="page_2"><p>a</p></div></div>"#);
        assert_eq!(
            nodes,
            vec![ContentNode::Element {
                block: Block::Page,
                attrs: vec![("id".into(), "2".into())],
                children: vec![p("a")],
            }]
        );
    }

    #[test]
    fn table_cells_become_flat_paragraphs() {
        let (nodes, report) = content("<table><tr><td>a</td><td>b</td></tr></table>");
        assert_eq!(nodes, vec![p("a"), p("b")]);
        assert_eq!(report.lost_chars(), 0);
    }

    #[test]
    fn list_items_around_paragraphs_are_discarded() {
        let (nodes, _) = content("<ul><li><p>x</p></li></ul>");
        assert_eq!(nodes, vec![p("x")]);
    }

    #[test]
    fn forbidden_tags_are_reported_and_text_kept() {
        let (nodes, report) = content("<p>a <abbr>b</abbr> <q>c</q></p>");
        assert_eq!(nodes, vec![p("a b c")]);
        assert_eq!(report.forbidden_tags, vec!["abbr".to_string(), "q".to_string()]);
        assert_eq!(report.lost_chars(), 0);
    }

    #[test]
    fn paragraph_attributes_are_cleared() {
        let (nodes, _) = content(r#"<h2 id="rubrik">Titel</h2>"#);
        assert_eq!(nodes, vec![p("Titel")]);
    }

    #[test]
    fn output_uses_only_pages_and_paragraphs() {
        let messy = r#"<div class="a"><div id="page_1"><center><h1>T</h1></center>
            <dl><dt>k</dt><dd>v</dd></dl><table><tr><th>x</th></tr></table>
            <text>inner</text><font color="red">f</font></div></div>"#;
        let (nodes, report) = content(messy);
        assert_closed(&nodes);
        assert_eq!(report.lost_chars(), 0);
        assert!(report.forbidden_tags.contains(&"text".to_string()));
    }

    /// Elements outside every vocabulary list above.
    const OTHER_ELEMENTS: &[&str] = &[
        "abbr",
        "address",
        "article",
        "aside",
        "blockquote",
        "button",
        "center",
        "cite",
        "code",
        "dd",
        "dl",
        "dt",
        "figure",
        "footer",
        "header",
        "kbd",
        "main",
        "nav",
        "noscript",
        "q",
        "section",
        "small",
        "var",
        "text",
        "page",
        "div",
        "p",
    ];

    #[test]
    fn every_tag_reduces_to_pages_and_paragraphs() {
        let tags = STRIPPED_TAGS
            .iter()
            .chain(PARAGRAPH_LIKE)
            .chain(DELETED_ELEMENTS)
            .chain(OTHER_ELEMENTS);
        for tag in tags {
            let wrapped = format!("<{tag}>x</{tag}>");
            let fragments = [
                wrapped.clone(),
                format!(r#"<div id="page_1">{wrapped}</div>"#),
                format!("<p>{wrapped}</p>"),
            ];
            for fragment in &fragments {
                match sanitize(fragment, "t", false) {
                    Sanitized::Content {
                        content, report, ..
                    } => {
                        assert_closed(&content);
                        assert_eq!(report.lost_chars(), 0, "{fragment}");
                    }
                    Sanitized::Empty => assert!(
                        DELETED_ELEMENTS.contains(tag),
                        "{fragment} lost its text"
                    ),
                }
            }
        }
    }

    #[test]
    fn blank_text_between_blocks_is_removed() {
        let (nodes, _) = content("<p>a</p>\n  <p>b</p>\n");
        assert_eq!(nodes, vec![p("a"), p("b")]);
    }

    #[test]
    fn bare_text_is_kept() {
        let (nodes, _) = content("just text");
        assert_eq!(nodes, vec![ContentNode::Text("just text".into())]);
    }

    #[test]
    fn debug_snapshot_shows_parsed_tree() {
        match sanitize("<p><b>x</b></p>", "t", true) {
            Sanitized::Content { snapshot, .. } => {
                assert_eq!(snapshot.as_deref(), Some("<text><p><b>x</b></p></text>"));
            }
            Sanitized::Empty => panic!("expected content"),
        }
    }
}
