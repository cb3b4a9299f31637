//! Character encoding handling for byte input
//!
//! Post bodies stored by older forum installs are not always UTF-8. This
//! module turns raw bytes into text before formatting, following a short
//! cascade:
//!
//! 1. **Byte order mark**: a UTF-8 or UTF-16 BOM decides the encoding
//! 2. **Declared charset**: a bare label (`latin1`) or a Content-Type value
//!    (`text/plain; charset=windows-1252`) supplied by the caller
//! 3. **Default to UTF-8**
//!
//! Decoding is lossy: malformed sequences become U+FFFD and unknown labels
//! fall back to UTF-8. Like the rest of the pipeline, decoding never fails.
//!
//! # Examples
//!
//! ```rust
//! use forum_markup::charset::decode_input;
//!
//! assert_eq!(decode_input(b"Caf\xE9", Some("ISO-8859-1")), "Café");
//! assert_eq!(decode_input(b"Caf\xC3\xA9", None), "Café");
//! assert_eq!(decode_input(b"bad \xFF byte", None), "bad \u{FFFD} byte");
//! ```

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Decode post bytes to text using BOM, declared charset, then UTF-8
pub fn decode_input<'a>(raw: &'a [u8], declared: Option<&str>) -> Cow<'a, str> {
    let encoding = Encoding::for_bom(raw)
        .map(|(encoding, _bom_len)| encoding)
        .or_else(|| declared.and_then(resolve_declared_charset))
        .unwrap_or(UTF_8);

    // `decode` strips a BOM matching any supported encoding by itself.
    let (text, actual, had_errors) = encoding.decode(raw);
    if had_errors {
        tracing::debug!(
            encoding = actual.name(),
            "malformed byte sequences replaced while decoding post text"
        );
    }
    text
}

/// Resolve a declared charset to an encoding
///
/// Accepts either a bare label or a Content-Type style value carrying a
/// `charset=` parameter. Returns `None` for unknown labels.
///
/// ```rust
/// use forum_markup::charset::resolve_declared_charset;
///
/// assert_eq!(resolve_declared_charset("latin1").map(|e| e.name()), Some("windows-1252"));
/// assert_eq!(
///     resolve_declared_charset("text/plain; charset=\"UTF-8\"").map(|e| e.name()),
///     Some("UTF-8")
/// );
/// assert!(resolve_declared_charset("x-unknown").is_none());
/// ```
pub fn resolve_declared_charset(declared: &str) -> Option<&'static Encoding> {
    let label = extract_charset_from_content_type(declared)
        .unwrap_or_else(|| declared.trim().to_string());
    Encoding::for_label(label.as_bytes())
}

/// Extract the `charset` parameter from a Content-Type value
///
/// # Supported Formats
///
/// - `text/plain; charset=UTF-8`
/// - `text/plain; charset="UTF-8"`
/// - `text/plain;charset=UTF-8` (no space)
///
/// ```rust
/// use forum_markup::charset::extract_charset_from_content_type;
///
/// assert_eq!(
///     extract_charset_from_content_type("text/plain; charset=\"ISO-8859-1\""),
///     Some("ISO-8859-1".to_string())
/// );
/// assert_eq!(extract_charset_from_content_type("text/plain"), None);
/// ```
pub fn extract_charset_from_content_type(content_type: &str) -> Option<String> {
    static CHARSET_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex =
        CHARSET_REGEX.get_or_init(|| Regex::new(r#"(?i)charset\s*=\s*"?([^";,\s]+)"?"#).ok());
    let regex = regex.as_ref()?;

    regex
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
