//! Paragraph and line-break normalization
//!
//! Runs on the raw post text before any HTML parsing. It knows nothing about
//! tags: angle brackets are ordinary characters here and embedded markup
//! passes through untouched for the repair stage to interpret.
//!
//! # Rules
//!
//! 1. Carriage returns are removed, so `\r\n` and `\r\n\r\n` behave like
//!    `\n` and `\n\n`.
//! 2. The text is split on every run of two or more newlines and each piece,
//!    empty pieces included, is wrapped in `<p>` and `</p>`.
//! 3. Any newline left over becomes `<br />`.
//!
//! ```rust
//! use forum_markup::paragraph::normalize_paragraphs;
//!
//! assert_eq!(normalize_paragraphs("first\r\n\r\nsecond"), "<p>first</p><p>second</p>");
//! assert_eq!(normalize_paragraphs("line1\nline2"), "<p>line1<br />line2</p>");
//! ```

use regex::Regex;
use std::sync::OnceLock;

const PARAGRAPH_OPEN: &str = "<p>";
const PARAGRAPH_CLOSE: &str = "</p>";
const LINE_BREAK: &str = "<br />";

fn paragraph_separator() -> Option<&'static Regex> {
    static SEPARATOR: OnceLock<Option<Regex>> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"\n{2,}").ok()).as_ref()
}

/// Wrap blank-line separated blocks in paragraphs and turn single newlines
/// into line breaks
pub fn normalize_paragraphs(raw: &str) -> String {
    let text = raw.replace('\r', "");

    let segments: Vec<&str> = match paragraph_separator() {
        Some(separator) => separator.split(&text).collect(),
        None => vec![text.as_str()],
    };

    let mut wrapped = String::with_capacity(text.len() + 7 * segments.len());
    for segment in segments {
        wrapped.push_str(PARAGRAPH_OPEN);
        wrapped.push_str(segment);
        wrapped.push_str(PARAGRAPH_CLOSE);
    }

    wrapped.replace('\n', LINE_BREAK)
}
