//! Generic tree-node capability used by block classification

use ego_tree::NodeRef;
use scraper::Node;

/// A read-only view of one node in a parsed document tree
///
/// Element nodes report a tag and attributes, text nodes report their text, and
/// every other node kind (document root, comments, doctype) reports neither.
/// Tag names are expected in lowercase.
pub trait ContentNode: Clone {
    /// Element tag name, or `None` for non-element nodes
    fn tag(&self) -> Option<&str>;

    /// Attribute value of an element node
    fn attr(&self, name: &str) -> Option<&str>;

    /// Character content of a text node
    fn text(&self) -> Option<&str>;

    /// Child nodes in document order
    fn children(&self) -> Vec<Self>;

    /// Parent node, `None` at the root of the tree
    fn parent(&self) -> Option<Self>;

    /// Returns true if this is an element with the given tag
    fn is_tag(&self, name: &str) -> bool {
        self.tag() == Some(name)
    }

    /// Whitespace-separated tokens of the `class` attribute
    fn classes(&self) -> std::str::SplitWhitespace<'_> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Returns true if the `class` attribute contains the given token
    fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Iterates over the ancestors of this node, nearest first
    fn ancestors(&self) -> Ancestors<Self> {
        Ancestors {
            next: self.parent(),
        }
    }
}

/// Iterator over a node's ancestors
pub struct Ancestors<N> {
    next: Option<N>,
}

impl<N: ContentNode> Iterator for Ancestors<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

impl<'a> ContentNode for NodeRef<'a, Node> {
    fn tag(&self) -> Option<&str> {
        self.value().as_element().map(|element| element.name())
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value()
            .as_element()
            .and_then(|element| element.attr(name))
    }

    fn text(&self) -> Option<&str> {
        self.value().as_text().map(|text| &**text)
    }

    fn children(&self) -> Vec<Self> {
        NodeRef::children(self).collect()
    }

    fn parent(&self) -> Option<Self> {
        NodeRef::parent(self)
    }
}
