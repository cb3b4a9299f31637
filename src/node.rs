//! Owned document tree
//!
//! The tree is a plain sum type: every node is either an element or a run of
//! text. Elements own their children outright, so a tree can be pruned by
//! dropping a child from its parent's vector.
//!
//! Nesting depth is unbounded. Traversals here use an explicit stack, and
//! dropping an element tears its subtree down iteratively, so a deep tree
//! never costs more than constant native stack.

use indexmap::IndexMap;

/// A single node of a parsed fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with a lowercased tag name, attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Attributes in document order, looked up by name
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes and no children
    ///
    /// The tag name is ASCII-lowercased.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// Builder-style child appender
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let Node::Element(mut element) = node {
                pending.append(&mut element.children);
            }
        }
    }
}

impl Node {
    pub fn text(content: &str) -> Self {
        Node::Text(content.to_string())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// The implicit root of a fragment
///
/// Mirrors the body scope of a parsed document. The root itself is never an
/// element and is never filtered or serialized; only its children are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    pub children: Vec<Node>,
}

impl Tree {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Visit every element in document order (pre-order)
    pub fn for_each_element<F>(&self, mut visit: F)
    where
        F: FnMut(&Element),
    {
        let mut stack: Vec<&Node> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if let Node::Element(element) = node {
                visit(element);
                stack.extend(element.children.iter().rev());
            }
        }
    }

    /// Concatenated text content of the whole tree
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        let mut stack: Vec<&Node> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => stack.extend(element.children.iter().rev()),
            }
        }
        out
    }
}
