//! Forum Markup - post text formatting and sanitization
//!
//! This library turns raw, untrusted text submitted by forum users into an
//! HTML fragment that is safe to place inside a rendered page.
//!
//! # Architecture
//!
//! The work is a single-direction pipeline, one module per stage:
//! - `paragraph`: blank-line blocks become `<p>`, single newlines become `<br />`
//! - `repair`: tolerant HTML5 parsing using html5ever
//! - `builder`: copies the repaired body into the owned `node` model
//! - `sanitizer`: prunes elements and strips attributes per a `policy`
//! - `serializer`: renders the tree (or the repaired markup) as an XHTML-style fragment
//! - `formatter`: composes the stages, enforces limits, offers a fallback
//! - `charset`: decodes byte input before the pipeline runs
//!
//! # Example
//!
//! ```rust
//! use forum_markup::format_for_display;
//!
//! let html = format_for_display("Hello <b onclick=\"x()\">there</b>\n\nBye").unwrap();
//! assert_eq!(html, "<p>Hello <b>there</b></p><p>Bye</p>");
//! ```

pub mod builder;
pub mod charset;
pub mod error;
pub mod formatter;
pub mod node;
pub mod paragraph;
pub mod policy;
pub mod repair;
pub mod sanitizer;
pub mod serializer;

pub use error::FormatError;
pub use formatter::{FormatContext, FormatOptions, Formatter, format_for_display};
pub use node::{Element, Node, Tree};
pub use policy::WhitelistPolicy;
pub use sanitizer::{SanitizeReport, sanitize};
pub use serializer::{escape_text, serialize_fragment, serialize_repaired};
