//! Tree builder: html5ever body scope to owned nodes
//!
//! Copies the children of the repaired document's body into a [`Tree`].
//! Every element, attribute and text run is carried over verbatim and in
//! document order; filtering is left to the sanitizer.
//!
//! Node kinds the owned model has no variant for (comments, doctypes,
//! processing instructions) are skipped. Template contents live outside the
//! child list in html5ever's DOM and are not copied.
//!
//! The walk keeps its open elements on an explicit stack, so nesting of any
//! depth is copied without growing the native stack.
//!
//! # Limits
//!
//! Nesting depth is checked against [`FormatContext::max_depth`] and the
//! context's deadline is polled every 100 nodes. Either limit surfaces as a
//! [`FormatError`], which is the only way this stage fails.
//!
//! # Pruning While Building
//!
//! [`build_pruned_tree`] consults a [`WhitelistPolicy`] as it goes and never
//! copies an element whose tag the policy rejects, nor anything below it.
//! The result is what [`crate::sanitizer::sanitize`] would leave behind for
//! tags; attributes are still the sanitizer's job.

use html5ever::Attribute;
use indexmap::IndexMap;
use markup5ever_rcdom::{Handle, NodeData};

use crate::error::FormatError;
use crate::formatter::FormatContext;
use crate::node::{Element, Node, Tree};
use crate::policy::WhitelistPolicy;
use crate::repair::{RepairedMarkup, qualified_name};

/// Build the owned tree for the repaired body scope
///
/// A document without a body (frameset input) builds an empty tree.
///
/// ```rust
/// use forum_markup::builder::build_tree;
/// use forum_markup::formatter::FormatContext;
/// use forum_markup::repair::repair_markup;
///
/// let repaired = repair_markup("<p>Hi <a href=\"/u/1\">there</a></p>");
/// let tree = build_tree(&repaired, &mut FormatContext::default()).unwrap();
/// assert_eq!(tree.children.len(), 1);
/// assert_eq!(tree.text_content(), "Hi there");
/// ```
pub fn build_tree(
    repaired: &RepairedMarkup,
    ctx: &mut FormatContext,
) -> Result<Tree, FormatError> {
    build(repaired, None, ctx).map(|built| built.tree)
}

/// An owned tree plus the number of subtrees left behind while building
#[derive(Debug)]
pub struct PrunedTree {
    pub tree: Tree,
    /// Elements not copied because the policy rejects their tag
    pub pruned_elements: usize,
}

/// Build the owned tree, skipping subtrees whose root tag `policy` rejects
///
/// ```rust
/// use forum_markup::builder::build_pruned_tree;
/// use forum_markup::formatter::FormatContext;
/// use forum_markup::policy::WhitelistPolicy;
/// use forum_markup::repair::repair_markup;
///
/// let repaired = repair_markup("<p>a<span><b>hidden</b></span>b</p>");
/// let built = build_pruned_tree(&repaired, &WhitelistPolicy::forum(), &mut FormatContext::default())?;
/// assert_eq!(built.tree.text_content(), "ab");
/// assert_eq!(built.pruned_elements, 1);
/// # Ok::<(), forum_markup::FormatError>(())
/// ```
pub fn build_pruned_tree(
    repaired: &RepairedMarkup,
    policy: &WhitelistPolicy,
    ctx: &mut FormatContext,
) -> Result<PrunedTree, FormatError> {
    build(repaired, Some(policy), ctx)
}

/// An element being filled, and the source node its children come from
struct Frame {
    source: Handle,
    next_child: usize,
    element: Element,
}

impl Frame {
    fn new(source: Handle, element: Element) -> Self {
        Self {
            source,
            next_child: 0,
            element,
        }
    }

    fn next_source_child(&mut self) -> Option<Handle> {
        let child = self.source.children.borrow().get(self.next_child).cloned();
        if child.is_some() {
            self.next_child += 1;
        }
        child
    }
}

fn build(
    repaired: &RepairedMarkup,
    policy: Option<&WhitelistPolicy>,
    ctx: &mut FormatContext,
) -> Result<PrunedTree, FormatError> {
    let mut built = PrunedTree {
        tree: Tree::default(),
        pruned_elements: 0,
    };
    let Some(body) = repaired.body() else {
        return Ok(built);
    };

    let mut root = Frame::new(body, Element::new("body"));
    let mut open: Vec<Frame> = Vec::new();

    loop {
        let current = open.last_mut().unwrap_or(&mut root);
        let Some(child) = current.next_source_child() else {
            // Current element is complete; attach it to its parent.
            match open.pop() {
                Some(done) => {
                    let parent = open.last_mut().unwrap_or(&mut root);
                    parent.element.children.push(Node::Element(done.element));
                    continue;
                }
                None => break,
            }
        };

        ctx.increment_and_check()?;

        match child.data {
            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                let depth = open.len() + 1;
                ctx.validate_depth(depth)?;

                let tag = qualified_name(name).to_ascii_lowercase();
                if let Some(policy) = policy {
                    if !policy.allows_tag(&tag) {
                        tracing::debug!(%tag, "skipping disallowed element subtree");
                        built.pruned_elements += 1;
                        continue;
                    }
                }

                let element = Element {
                    name: tag,
                    attrs: copy_attributes(&attrs.borrow()),
                    children: Vec::new(),
                };
                open.push(Frame::new(child.clone(), element));
            }
            NodeData::Text { ref contents } => {
                let text = contents.borrow();
                current.element.children.push(Node::Text(String::from(&**text)));
            }
            NodeData::Document
            | NodeData::Doctype { .. }
            | NodeData::Comment { .. }
            | NodeData::ProcessingInstruction { .. } => {}
        }
    }

    built.tree.children = std::mem::take(&mut root.element.children);
    Ok(built)
}

fn copy_attributes(attrs: &[Attribute]) -> IndexMap<String, String> {
    attrs
        .iter()
        .map(|attr| (qualified_name(&attr.name), String::from(&*attr.value)))
        .collect()
}
