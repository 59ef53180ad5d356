//! DOM Module - Mutable arena-based XML tree
//!
//! The tree is the single source of truth for a transcription document:
//! - Arena allocation for nodes; detached nodes keep their slot
//! - NodeId (u32) handles that mapped elements hold without owning
//! - String interning for element/attribute names
//! - Namespace resolution stack for the loader

pub mod axes;
pub mod document;
pub mod loader;
pub mod namespace;
pub mod node;
pub mod strings;
pub mod writer;

pub use document::Document;
pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode, DOCUMENT_NODE};
pub use strings::StringPool;

/// Read access to a tree - traversal, classification and the Initializer
/// are written against this trait rather than the concrete arena.
pub trait DocumentAccess {
    /// Get root element ID
    fn root_element_id(&self) -> Option<NodeId>;

    /// Get a node by ID
    fn get_node(&self, id: NodeId) -> Option<&XmlNode>;

    /// Get the qualified node name (elements only)
    fn node_name(&self, id: NodeId) -> Option<&str>;

    /// Get the namespace URI of an element, if it has one
    fn namespace_uri(&self, id: NodeId) -> Option<&str>;

    /// Get text content of a text node
    fn text_content(&self, id: NodeId) -> Option<&str>;

    /// Get attribute value by qualified name
    fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<&str>;

    /// Get node local name (without prefix)
    fn node_local_name(&self, id: NodeId) -> Option<&str> {
        let name = self.node_name(id)?;
        match name.find(':') {
            Some(pos) => Some(&name[pos + 1..]),
            None => Some(name),
        }
    }

    fn node_kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.parent)
    }

    fn first_child_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.first_child)
    }

    fn last_child_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.last_child)
    }

    fn next_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.next_sibling)
    }

    fn prev_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.prev_sibling)
    }

    /// Children in document order
    fn children_vec(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut child = self.first_child_of(id);
        while let Some(c) = child {
            result.push(c);
            child = self.next_sibling_of(c);
        }
        result
    }

    fn is_element(&self, id: NodeId) -> bool {
        self.node_kind_of(id) == Some(NodeKind::Element)
    }

    fn is_text(&self, id: NodeId) -> bool {
        self.node_kind_of(id) == Some(NodeKind::Text)
    }
}

/// Number of chars in a string; every view offset in the crate is in chars.
#[inline]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `char_idx`-th char, clamped to the string length
#[inline]
pub fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
