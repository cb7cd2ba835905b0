//! Metadata extraction: one document record → one NormalizedDocument
//!
//! The record's `dokument` container provides the main markup and most
//! scalar metadata. The rest of the record is searched for auxiliary text
//! fields (speeches, proposal wordings, votes) and for stakeholders, whose
//! names and party codes are aggregated onto the main segment.

use chrono::Datelike;

use crate::clean::{clean_fragment, unescape_markup};
use crate::document::{ContentNode, KIND_ATTR, NormalizedDocument, TextSegment};
use crate::error::ExtractError;
use crate::record::{RecordNode, parse_record};
use crate::sanitize::{Sanitized, sanitize};

/// Primary container inside a record.
const DOCUMENT_TAG: &str = "dokument";
/// Main markup field of the primary container.
const HTML_TAG: &str = "html";
/// Plain-text duplicate of the main markup.
const PLAIN_TEXT_TAG: &str = "text";
const IMAGES_TAG: &str = "images";

/// Primary container fields copied onto the document root.
const DOCUMENT_ATTRS: &[&str] = &[
    "dok_id",
    "dokumentstatus_url_xml",
    "dokument_url_text",
    "dokument_url_html",
];

const STAKEHOLDER_TAG: &str = "intressent";
const STAKEHOLDER_NAME: &str = "namn";
const STAKEHOLDER_PARTY: &str = "partibet";

const ATTR_PREFIX: &str = "anf_";

pub const NAME_PARTY_ATTR: &str = "intressent_namn_parti";
pub const NAME_ATTR: &str = "intressent_namn";
pub const PARTY_ATTR: &str = "intressent_parti";

const DATETIME_ATTR: &str = "datumtid";
const DATE_ATTR: &str = "datum";
const EARLIEST_YEAR: i32 = 1900;

/// Record element that can own an auxiliary text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParentKind {
    Anforande,
    Forslag,
    Uppgift,
    Utskottsforslag,
}

impl ParentKind {
    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "anforande" => Some(Self::Anforande),
            "forslag" => Some(Self::Forslag),
            "uppgift" => Some(Self::Uppgift),
            "utskottsforslag" => Some(Self::Utskottsforslag),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Anforande => "anforande",
            Self::Forslag => "forslag",
            Self::Uppgift => "uppgift",
            Self::Utskottsforslag => "utskottsforslag",
        }
    }
}

/// Field holding markup or text inside a [`ParentKind`] element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildKind {
    AnfText,
    Lydelse,
    Lydelse2,
    Text,
    VoteringSammanfattningHtml,
}

impl ChildKind {
    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "anf_text" => Some(Self::AnfText),
            "lydelse" => Some(Self::Lydelse),
            "lydelse2" => Some(Self::Lydelse2),
            "text" => Some(Self::Text),
            "votering_sammanfattning_html" => Some(Self::VoteringSammanfattningHtml),
            _ => None,
        }
    }
}

/// Segment kind for a (parent, child) element pair, if it is a text source.
fn auxiliary_kind(parent: &str, child: &str) -> Option<&'static str> {
    use ChildKind::*;
    use ParentKind::*;

    let pair = (ParentKind::parse(parent)?, ChildKind::parse(child)?);
    match pair {
        (Anforande, AnfText)
        | (Forslag, Lydelse | Lydelse2)
        | (Uppgift, Text)
        | (Utskottsforslag, VoteringSammanfattningHtml) => Some(pair.0.as_str()),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Dates with a later year are treated as corrupt
    pub current_year: i32,
    /// Keep the parsed, unreduced fragment trees
    pub debug: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            current_year: chrono::Local::now().year(),
            debug: false,
        }
    }
}

/// A non-empty normalized document and its serialized form.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub document: NormalizedDocument,
    pub xml: Vec<u8>,
    /// Fragment trees before reduction, debug mode only
    pub snapshots: Vec<String>,
}

/// Parse and normalize one archive entry.
///
/// `Ok(None)` means the entry holds no text; it is not an error.
pub fn extract(
    bytes: &[u8],
    filename: &str,
    opts: &ExtractOptions,
) -> Result<Option<Extraction>, ExtractError> {
    let record = parse_record(bytes)?;
    let mut snapshots = Vec::new();
    let Some(document) = normalize(&record, filename, opts, &mut snapshots)? else {
        return Ok(None);
    };
    let xml = document.to_xml()?;
    Ok(Some(Extraction {
        document,
        xml,
        snapshots,
    }))
}

/// Build the NormalizedDocument for a parsed record.
pub fn normalize(
    record: &RecordNode,
    filename: &str,
    opts: &ExtractOptions,
    snapshots: &mut Vec<String>,
) -> Result<Option<NormalizedDocument>, ExtractError> {
    let primary = if record.tag == DOCUMENT_TAG {
        record
    } else {
        record
            .child(DOCUMENT_TAG)
            .ok_or(ExtractError::MissingDocument)?
    };
    if primary.child(HTML_TAG).is_none() {
        log::warn!("No html found in {filename}");
    }

    let mut doc = NormalizedDocument::new();
    let mut main = TextSegment::main();
    for field in &primary.children {
        match field.tag.as_str() {
            HTML_TAG => {
                if let Some(markup) = field.text.as_deref() {
                    main.content
                        .extend(segment_content(markup, filename, opts.debug, snapshots));
                }
            }
            PLAIN_TEXT_TAG | IMAGES_TAG | KIND_ATTR => {}
            tag if field.has_text() => {
                let value = field.text.as_deref().unwrap_or_default();
                if DOCUMENT_ATTRS.contains(&tag) {
                    doc.attrs.set(tag, value);
                } else {
                    main.attrs.set(tag, value);
                }
            }
            _ => {}
        }
    }
    doc.segments.push(main);

    let mut stakeholders = Stakeholders::default();
    walk_record(record, primary, &mut |parent, node| {
        if node.tag == STAKEHOLDER_TAG {
            let name = node.child_text(STAKEHOLDER_NAME).unwrap_or_default();
            let party = node.child_text(STAKEHOLDER_PARTY).unwrap_or_default();
            stakeholders.push(name, party);
            return;
        }
        let Some(parent) = parent else { return };
        if !node.has_text() {
            return;
        }
        let Some(kind) = auxiliary_kind(&parent.tag, &node.tag) else {
            return;
        };

        let markup = node.text.as_deref().unwrap_or_default();
        let content = segment_content(markup, filename, opts.debug, snapshots);
        if content.is_empty() {
            return;
        }
        let mut segment = TextSegment::new(kind);
        segment.content = content;
        for sibling in &parent.children {
            if std::ptr::eq(sibling, node) {
                continue;
            }
            let Some(value) = sibling.text.as_deref().filter(|t| !t.trim().is_empty()) else {
                continue;
            };
            let name = sibling
                .tag
                .strip_prefix(ATTR_PREFIX)
                .unwrap_or(&sibling.tag);
            if name == KIND_ATTR {
                continue;
            }
            segment.attrs.set(name, value.trim());
        }
        doc.segments.push(segment);
    });

    if !doc.has_text() {
        log::debug!("No text in {filename}");
        return Ok(None);
    }

    if let Some(aggregates) = stakeholders.aggregates() {
        if let Some(main) = doc.main_segment_mut() {
            main.attrs.set(NAME_PARTY_ATTR, aggregates.name_party);
            main.attrs.set(NAME_ATTR, aggregates.names);
            main.attrs.set(PARTY_ATTR, aggregates.parties);
        }
    }

    normalize_dates(&mut doc, opts.current_year, filename);
    Ok(Some(doc))
}

/// Prepare, clean and sanitize one markup field.
fn segment_content(
    markup: &str,
    filename: &str,
    debug: bool,
    snapshots: &mut Vec<String>,
) -> Vec<ContentNode> {
    let cleaned = clean_fragment(&unescape_markup(markup));
    if cleaned.is_empty() {
        return Vec::new();
    }
    match sanitize(&cleaned, filename, debug) {
        Sanitized::Content {
            content, snapshot, ..
        } => {
            snapshots.extend(snapshot);
            content
        }
        Sanitized::Empty => Vec::new(),
    }
}

/// Visit every element with its parent, skipping the `skip` subtree.
fn walk_record<'a>(
    root: &'a RecordNode,
    skip: &RecordNode,
    visit: &mut dyn FnMut(Option<&'a RecordNode>, &'a RecordNode),
) {
    let mut stack: Vec<(Option<&'a RecordNode>, &'a RecordNode)> = vec![(None, root)];
    while let Some((parent, node)) = stack.pop() {
        if std::ptr::eq(node, skip) {
            continue;
        }
        visit(parent, node);
        for child in node.children.iter().rev() {
            stack.push((Some(node), child));
        }
    }
}

/// Stakeholder (name, party) pairs in first-seen order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stakeholders(Vec<(String, String)>);

/// Pipe-delimited strings derived from [`Stakeholders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeholderAggregates {
    pub name_party: String,
    pub names: String,
    pub parties: String,
}

impl Stakeholders {
    /// Add a pair; the party code is uppercased, blank names or parties are ignored.
    pub fn push(&mut self, name: &str, party: &str) {
        let name = name.trim();
        let party = party.trim().to_uppercase();
        if name.is_empty() || party.is_empty() {
            return;
        }
        if !self.0.iter().any(|(n, p)| n == name && *p == party) {
            self.0.push((name.to_owned(), party));
        }
    }

    pub fn aggregates(&self) -> Option<StakeholderAggregates> {
        if self.0.is_empty() {
            return None;
        }
        let mut parties: Vec<&str> = Vec::new();
        for (_, party) in &self.0 {
            if !parties.contains(&party.as_str()) {
                parties.push(party);
            }
        }
        let name_party: Vec<String> = self.0.iter().map(|(n, p)| format!("{n} ({p})")).collect();
        let names: Vec<&str> = self.0.iter().map(|(n, _)| n.as_str()).collect();

        Some(StakeholderAggregates {
            name_party: pipe_join(&name_party),
            names: pipe_join(&names),
            parties: pipe_join(&parties),
        })
    }
}

fn pipe_join<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::from("|");
    for item in items {
        out.push_str(item.as_ref());
        out.push('|');
    }
    out
}

/// Date part of a combined date-time value.
fn date_part(value: &str) -> &str {
    value.split(['T', ' ']).next().unwrap_or(value)
}

/// Move `datumtid` into `datum` everywhere, then drop implausible segment dates.
fn normalize_dates(doc: &mut NormalizedDocument, current_year: i32, filename: &str) {
    if let Some(value) = doc.attrs.remove(DATETIME_ATTR) {
        doc.attrs.set(DATE_ATTR, date_part(&value));
    }
    for segment in &mut doc.segments {
        if let Some(value) = segment.attrs.remove(DATETIME_ATTR) {
            segment.attrs.set(DATE_ATTR, date_part(&value));
        }
        let Some(date) = segment.attrs.get(DATE_ATTR) else {
            continue;
        };
        let year = date.get(..4).and_then(|y| y.parse::<i32>().ok());
        if !year.is_some_and(|y| (EARLIEST_YEAR..=current_year).contains(&y)) {
            log::debug!("Dropping implausible date {date:?} in {filename}");
            segment.attrs.remove(DATE_ATTR);
        }
    }
}
