//! Fragment serialization
//!
//! Renders a [`Tree`] as an XHTML-style fragment. Only the root's children
//! are written; there is never an `html` or `body` envelope.
//!
//! # Output Rules
//!
//! - Elements: `<name attr="value">children</name>`, attributes in stored order
//! - Void elements (`br`, `img`, ...) without children: `<br />`
//! - Text: `&`, `<` and `>` escaped
//! - Attribute values: double-quoted, with `&`, `<`, `>` and `"` escaped
//!
//! No whitespace is added or removed, so output is byte-for-byte
//! deterministic for a given tree. Both writers walk with an explicit stack,
//! so nesting depth does not matter.

use markup5ever_rcdom::{Handle, NodeData};

use crate::node::{Node, Tree};
use crate::repair::{RepairedMarkup, qualified_name};

/// Elements that can never have content and are written self-closed
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

enum Step<'a> {
    Visit(&'a Node),
    Close(&'a str),
}

/// Serialize the children of `tree` to a markup fragment
///
/// ```rust
/// use forum_markup::node::{Element, Node, Tree};
/// use forum_markup::serializer::serialize_fragment;
///
/// let tree = Tree::new(vec![
///     Element::new("p")
///         .with_child(Node::text("line1"))
///         .with_child(Element::new("br").into())
///         .with_child(Node::text("1 < 2"))
///         .into(),
/// ]);
/// assert_eq!(serialize_fragment(&tree), "<p>line1<br />1 &lt; 2</p>");
/// ```
pub fn serialize_fragment(tree: &Tree) -> String {
    let mut output = String::with_capacity(256);
    let mut stack: Vec<Step> = tree.children.iter().rev().map(Step::Visit).collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Close(name) => write_end_tag(name, &mut output),
            Step::Visit(Node::Text(text)) => escape_into(text, false, &mut output),
            Step::Visit(Node::Element(element)) => {
                let self_close = element.children.is_empty() && is_void(&element.name);
                write_start_tag(&element.name, &element.attrs, self_close, &mut output);
                if !self_close {
                    stack.push(Step::Close(&element.name));
                    stack.extend(element.children.iter().rev().map(Step::Visit));
                }
            }
        }
    }
    output
}

enum RepairedStep {
    Visit(Handle),
    Close(String),
}

/// Render the repaired body scope, unfiltered, as a well-formed fragment
///
/// This is the repaired markup exactly as the tree builder sees it, with the
/// same naming and escaping rules as [`serialize_fragment`]. Comments and
/// other node kinds without an owned counterpart are left out. There is no
/// depth limit, so every text run of the input survives.
///
/// ```rust
/// use forum_markup::repair::repair_markup;
/// use forum_markup::serializer::serialize_repaired;
///
/// let repaired = repair_markup("<p><b><i>misnested</b></i> <span onclick=\"x\">kept</span>");
/// assert_eq!(
///     serialize_repaired(&repaired),
///     "<p><b><i>misnested</i></b> <span onclick=\"x\">kept</span></p>"
/// );
/// ```
pub fn serialize_repaired(repaired: &RepairedMarkup) -> String {
    let mut output = String::with_capacity(256);
    let Some(body) = repaired.body() else {
        return output;
    };

    let mut stack: Vec<RepairedStep> = children_in_reverse(&body);
    while let Some(step) = stack.pop() {
        match step {
            RepairedStep::Close(name) => write_end_tag(&name, &mut output),
            RepairedStep::Visit(handle) => match handle.data {
                NodeData::Text { ref contents } => {
                    let text = contents.borrow();
                    escape_into(&**text, false, &mut output);
                }
                NodeData::Element {
                    ref name,
                    ref attrs,
                    ..
                } => {
                    let tag = qualified_name(name).to_ascii_lowercase();
                    let attrs: Vec<(String, String)> = attrs
                        .borrow()
                        .iter()
                        .map(|attr| (qualified_name(&attr.name), String::from(&*attr.value)))
                        .collect();
                    let self_close = handle.children.borrow().is_empty() && is_void(&tag);
                    write_start_tag(&tag, attrs, self_close, &mut output);
                    if !self_close {
                        stack.push(RepairedStep::Close(tag));
                        stack.extend(children_in_reverse(&handle));
                    }
                }
                NodeData::Document
                | NodeData::Doctype { .. }
                | NodeData::Comment { .. }
                | NodeData::ProcessingInstruction { .. } => {}
            },
        }
    }
    output
}

fn children_in_reverse(parent: &Handle) -> Vec<RepairedStep> {
    parent
        .children
        .borrow()
        .iter()
        .rev()
        .cloned()
        .map(RepairedStep::Visit)
        .collect()
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn write_start_tag<I, N, V>(name: &str, attrs: I, self_close: bool, output: &mut String)
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<str>,
    V: AsRef<str>,
{
    output.push('<');
    output.push_str(name);
    for (attr_name, value) in attrs {
        output.push(' ');
        output.push_str(attr_name.as_ref());
        output.push_str("=\"");
        escape_into(value.as_ref(), true, output);
        output.push('"');
    }
    output.push_str(if self_close { " />" } else { ">" });
}

fn write_end_tag(name: &str, output: &mut String) {
    output.push_str("</");
    output.push_str(name);
    output.push('>');
}

fn escape_into(text: &str, in_attribute: bool, output: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' if in_attribute => output.push_str("&quot;"),
            _ => output.push(ch),
        }
    }
}

/// Escape text for use as plain content or inside a quoted attribute
///
/// Used for the unformatted fallback when the pipeline fails.
///
/// ```rust
/// use forum_markup::serializer::escape_text;
///
/// assert_eq!(escape_text("<b>\"hi\" & 'bye'</b>"), "&lt;b&gt;&quot;hi&quot; &amp; &#39;bye&#39;&lt;/b&gt;");
/// ```
pub fn escape_text(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len() + 16);
    for ch in raw.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(ch),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Element;

    #[test]
    fn test_empty_tree() {
        assert_eq!(serialize_fragment(&Tree::default()), "");
    }

    #[test]
    fn test_text_is_escaped() {
        let tree = Tree::new(vec![Node::text("a < b && c > d \"q\"")]);
        assert_eq!(
            serialize_fragment(&tree),
            "a &lt; b &amp;&amp; c &gt; d \"q\""
        );
    }

    #[test]
    fn test_attributes_are_quoted_and_escaped() {
        let tree = Tree::new(vec![
            Element::new("a")
                .with_attr("href", "/x?a=1&b=\"2\"")
                .with_attr("title", "<t>")
                .with_child(Node::text("link"))
                .into(),
        ]);
        assert_eq!(
            serialize_fragment(&tree),
            "<a href=\"/x?a=1&amp;b=&quot;2&quot;\" title=\"&lt;t&gt;\">link</a>"
        );
    }

    #[test]
    fn test_void_elements_self_close() {
        let tree = Tree::new(vec![
            Element::new("img").with_attr("src", "s.png").into(),
            Element::new("br").into(),
        ]);
        assert_eq!(serialize_fragment(&tree), "<img src=\"s.png\" /><br />");
    }

    #[test]
    fn test_empty_non_void_elements_get_close_tag() {
        let tree = Tree::new(vec![Element::new("p").into(), Element::new("b").into()]);
        assert_eq!(serialize_fragment(&tree), "<p></p><b></b>");
    }

    #[test]
    fn test_nested_structure_and_order() {
        let tree = Tree::new(vec![
            Element::new("p")
                .with_child(Node::text("a"))
                .with_child(
                    Element::new("b")
                        .with_child(Element::new("i").with_child(Node::text("b")).into())
                        .into(),
                )
                .with_child(Node::text("c"))
                .into(),
            Element::new("p").with_child(Node::text("d")).into(),
        ]);
        assert_eq!(
            serialize_fragment(&tree),
            "<p>a<b><i>b</i></b>c</p><p>d</p>"
        );
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let tree = Tree::new(vec![Node::text("  two  spaces\t")]);
        assert_eq!(serialize_fragment(&tree), "  two  spaces\t");
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let tree = Tree::new(vec![
            Element::new("img")
                .with_attr("alt", "a")
                .with_attr("src", "s")
                .with_attr("title", "t")
                .into(),
        ]);
        let first = serialize_fragment(&tree);
        for _ in 0..10 {
            assert_eq!(serialize_fragment(&tree.clone()), first);
        }
    }

    #[test]
    fn test_very_deep_tree_serializes() {
        let depth = 100_000;
        let mut node = Node::text("x");
        for _ in 0..depth {
            node = Element::new("i").with_child(node).into();
        }
        let html = serialize_fragment(&Tree::new(vec![node]));

        assert_eq!(html.len(), depth * ("<i>".len() + "</i>".len()) + 1);
        assert!(html.starts_with("<i><i>"));
        assert!(html.contains("<i>x</i>"));
    }

    #[test]
    fn test_repaired_markup_matches_owned_serialization() {
        use crate::builder::build_tree;
        use crate::formatter::FormatContext;
        use crate::repair::repair_markup;

        let repaired = repair_markup("<p>a <b title=\"t\">b<br>c</b> <img src=\"s\"><!-- c --></p>");
        let tree = build_tree(&repaired, &mut FormatContext::default()).expect("build");
        assert_eq!(serialize_repaired(&repaired), serialize_fragment(&tree));
    }

    #[test]
    fn test_escape_text_plain() {
        assert_eq!(escape_text("no markup"), "no markup");
        assert_eq!(escape_text(""), "");
    }
}
