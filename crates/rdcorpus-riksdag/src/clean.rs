//! Character-level scrubbing of embedded markup before it is parsed
//!
//! Nothing here understands HTML structure; every step is a plain text
//! substitution, so malformed input is cleaned as far as possible and
//! never rejected.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use unic_ucd::GeneralCategory;

/// Numeric character references for code points 0-9, 11-31 and 127-159.
static CONTROL_CHAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&#(?:[0-9]|1[1-9]|2[0-9]|3[01]|12[7-9]|1[3-5][0-9]);").expect("valid regex")
});

static UNDERSCORE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__+").expect("valid regex"));

static NOBR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?NOBR>").expect("valid regex"));

static BR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:br|BR)(?: [^>]*)?/?>").expect("valid regex"));

/// Conditional-comment debris left by word processors exporting to HTML.
const CONDITIONAL_MARKERS: &[&str] = &[
    "<![if ! IE]>",
    "<!--[if lte IE 7]>",
    "<!--[if gte IE 8]>",
    "<![if !vml]>",
    "<![if !supportMisalignedColumns]>",
    "<![if !supportLineBreakNewLine]>",
    "<![if !supportEmptyParas]>",
    "<![endif]-->",
    "<![endif]>",
];

const SOFT_HYPHEN: char = '\u{AD}';

fn is_stripped_control(c: char) -> bool {
    matches!(c as u32, 0..=9 | 11..=31 | 127..=159)
}

/// Control (Cc) and format (Cf) characters, except line feed.
fn is_invisible(c: char) -> bool {
    c != '\n'
        && matches!(
            GeneralCategory::of(c),
            GeneralCategory::Control | GeneralCategory::Format
        )
}

/// Undo one more level of escaping for `&lt;`, `&gt;` and `&amp;`.
///
/// Record payloads store their HTML escaped inside XML text, and some
/// exports escape it twice.
pub fn unescape_markup(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&"),
    )
}

/// Scrub a markup fragment, applying every step in a fixed order.
pub fn clean_fragment(text: &str) -> String {
    let text = CONTROL_CHAR_REF.replace_all(text, "");
    let text: String = text
        .chars()
        .filter(|&c| !is_stripped_control(c) && !is_invisible(c))
        .map(|c| match c {
            '\u{A0}' | '\u{2006}' => ' ',
            other => other,
        })
        .collect();

    let text = UNDERSCORE_RUN.replace_all(&text, "");
    let mut text = text.into_owned();
    for marker in CONDITIONAL_MARKERS {
        if text.contains(marker) {
            text = text.replace(marker, "");
        }
    }
    let text = NOBR.replace_all(&text, "");
    let text = text.replace("&nbsp;", "");
    let text = BR.replace_all(&text, "\n");

    text.chars().filter(|&c| c != SOFT_HYPHEN).collect()
}
