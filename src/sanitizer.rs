//! Whitelist sanitization of the owned tree
//!
//! Walks the tree and enforces a [`WhitelistPolicy`]:
//!
//! 1. **Text** is never touched.
//! 2. **Disallowed elements** are pruned: the element and its whole subtree
//!    are removed, including descendants the policy would otherwise keep.
//!    The check happens before descending, so a disallowed ancestor always
//!    shadows its children. Nothing is unwrapped.
//! 3. **Allowed elements** lose every attribute the policy rejects; the rest
//!    keep their values and relative order. Children are then visited in
//!    their original order.
//!
//! The root [`Tree`] is a container, not an element, and is never pruned.
//!
//! Removal goes through `Vec::retain_mut` on the authoritative child list,
//! which visits each sibling exactly once in order while dropping the
//! rejected ones, so no sibling is skipped when its neighbour is removed.
//! Surviving child lists are queued on an explicit worklist rather than
//! recursed into, so the walk handles nesting of any depth. Every decision
//! depends only on the node itself, so the visiting order does not change
//! the result.
//!
//! # Example
//!
//! ```rust
//! use forum_markup::node::{Element, Node, Tree};
//! use forum_markup::policy::WhitelistPolicy;
//! use forum_markup::sanitizer::sanitize;
//!
//! let mut tree = Tree::new(vec![
//!     Element::new("div")
//!         .with_child(Element::new("b").with_child(Node::text("x")).into())
//!         .into(),
//!     Element::new("a")
//!         .with_attr("href", "ok")
//!         .with_attr("onclick", "bad")
//!         .with_child(Node::text("t"))
//!         .into(),
//! ]);
//!
//! let report = sanitize(&mut tree, &WhitelistPolicy::forum());
//! assert_eq!(report.pruned_elements, 1);
//! assert_eq!(report.stripped_attributes, 1);
//! assert_eq!(tree.text_content(), "t");
//! ```

use crate::node::{Element, Node, Tree};
use crate::policy::WhitelistPolicy;

/// What a sanitization pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Elements removed together with their subtrees (subtree elements not counted)
    pub pruned_elements: usize,
    /// Attributes removed from retained elements
    pub stripped_attributes: usize,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        self.pruned_elements == 0 && self.stripped_attributes == 0
    }
}

/// Enforce `policy` on `tree` in place
///
/// Cannot fail: the worst case is an empty tree.
pub fn sanitize(tree: &mut Tree, policy: &WhitelistPolicy) -> SanitizeReport {
    let mut report = SanitizeReport::default();
    let mut pending: Vec<&mut Vec<Node>> = vec![&mut tree.children];

    while let Some(children) = pending.pop() {
        sanitize_siblings(children, policy, &mut report);
        for child in children.iter_mut() {
            if let Node::Element(element) = child {
                pending.push(&mut element.children);
            }
        }
    }
    report
}

/// Prune rejected siblings and strip attributes from the rest
fn sanitize_siblings(
    children: &mut Vec<Node>,
    policy: &WhitelistPolicy,
    report: &mut SanitizeReport,
) {
    children.retain_mut(|child| match child {
        Node::Text(_) => true,
        Node::Element(element) => {
            if !policy.allows_tag(&element.name) {
                tracing::debug!(tag = %element.name, "pruning disallowed element");
                report.pruned_elements += 1;
                return false;
            }
            strip_attributes(element, policy, report);
            true
        }
    });
}

fn strip_attributes(element: &mut Element, policy: &WhitelistPolicy, report: &mut SanitizeReport) {
    let tag = &element.name;
    element.attrs.retain(|name, value| {
        let keep = policy.allows_attribute_value(name, value);
        if !keep {
            tracing::debug!(%tag, attribute = %name, "stripping disallowed attribute");
            report.stripped_attributes += 1;
        }
        keep
    });
}
