//! Tolerant markup repair using html5ever
//!
//! Post text reaching this stage is a mix of paragraph markers, whatever
//! markup the user typed, and plain text that merely looks like markup. The
//! repairer turns all of it into a well-formed tree without ever failing.
//!
//! # Overview
//!
//! Parsing follows the WHATWG HTML5 algorithm as implemented by html5ever,
//! so repairs match what browsers do with the same input:
//!
//! - **Unclosed tags** are closed at the end of their scope
//! - **Misnested formatting** (`<b><i>x</b></i>`) is reconstructed
//! - **Stray angle brackets** (`2 < 3`) and unknown entities become text
//! - **Scripting** is disabled; nothing is executed or fetched
//!
//! The input is parsed as a whole document so that html5ever supplies the
//! `html`/`head`/`body` scaffolding. Only the body scope is exposed to later
//! stages; the scaffolding never reaches formatted output.
//!
//! # Examples
//!
//! ```rust
//! use forum_markup::repair::repair_markup;
//! use forum_markup::serializer::serialize_repaired;
//!
//! let repaired = repair_markup("<p><b>unclosed");
//! assert_eq!(serialize_repaired(&repaired), "<p><b>unclosed</b></p>");
//!
//! let repaired = repair_markup("<p>2 < 3 &bogus;</p>");
//! assert_eq!(serialize_repaired(&repaired), "<p>2 &lt; 3 &amp;bogus;</p>");
//! ```

use html5ever::QualName;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// A parsed and repaired document, anchored on its body element
pub struct RepairedMarkup {
    dom: RcDom,
}

impl RepairedMarkup {
    /// The underlying html5ever DOM, scaffolding included
    pub fn dom(&self) -> &RcDom {
        &self.dom
    }

    /// The body element whose children form the repaired fragment
    ///
    /// Returns `None` when the document has no body, which happens when the
    /// input opened a frameset in place of it.
    pub fn body(&self) -> Option<Handle> {
        let html = find_child_element(&self.dom.document, "html")?;
        find_child_element(&html, "body")
    }
}

/// Repair arbitrary text-with-markup into a well-formed document
///
/// This never fails: html5ever recovers from every tokenizer and tree
/// construction error, so any string yields some document.
pub fn repair_markup(text: &str) -> RepairedMarkup {
    let dom = parse_document(RcDom::default(), Default::default()).one(text);
    RepairedMarkup { dom }
}

/// `prefix:local` for namespaced names, `local` otherwise
pub fn qualified_name(name: &QualName) -> String {
    match name.prefix {
        Some(ref prefix) => format!("{}:{}", &**prefix, &*name.local),
        None => String::from(&*name.local),
    }
}

fn find_child_element(parent: &Handle, tag_name: &str) -> Option<Handle> {
    parent
        .children
        .borrow()
        .iter()
        .find(|child| match child.data {
            NodeData::Element { ref name, .. } => name.local.as_ref() == tag_name,
            _ => false,
        })
        .cloned()
}
