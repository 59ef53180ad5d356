//! Tree node representation
//!
//! Uses NodeId (u32) for compact, copyable node references that stay valid
//! for the lifetime of the arena, including after a node is detached.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// The document node always lives at index 0
pub const DOCUMENT_NODE: NodeId = 0;

/// Type of tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content (CDATA is folded into text on load)
    Text,
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the document node and detached subtrees)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for the qualified name (elements only)
    pub name_id: u32,
    /// Index into string pool for the namespace URI, or 0
    pub namespace_id: u32,
    /// Text content (text nodes only)
    pub text: String,
    /// Attributes in document order (elements only)
    pub attributes: Vec<XmlAttribute>,
}

impl XmlNode {
    /// Create a new document root node
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document)
    }

    /// Create a new, unlinked element node
    pub fn element(name_id: u32, namespace_id: u32) -> Self {
        let mut node = Self::with_kind(NodeKind::Element);
        node.name_id = name_id;
        node.namespace_id = namespace_id;
        node
    }

    /// Create a new, unlinked text node
    pub fn text(content: impl Into<String>) -> Self {
        let mut node = Self::with_kind(NodeKind::Text);
        node.text = content.into();
        node
    }

    fn with_kind(kind: NodeKind) -> Self {
        XmlNode {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            namespace_id: 0,
            text: String::new(),
            attributes: Vec::new(),
        }
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this is a text node
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}

/// Stored attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Index into string pool for the qualified attribute name
    pub name_id: u32,
    /// Attribute value (entity-decoded)
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name_id: u32, value: impl Into<String>) -> Self {
        XmlAttribute {
            name_id,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let doc = XmlNode::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert!(!doc.has_children());
    }

    #[test]
    fn test_element_node() {
        let elem = XmlNode::element(1, 2);
        assert!(elem.is_element());
        assert_eq!(elem.name_id, 1);
        assert_eq!(elem.namespace_id, 2);
        assert!(elem.parent.is_none());
    }

    #[test]
    fn test_text_node() {
        let text = XmlNode::text("hello");
        assert!(text.is_text());
        assert_eq!(text.text, "hello");
    }
}
