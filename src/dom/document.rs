//! XML Document - Mutable arena-based tree
//!
//! Nodes are never freed: detaching a node unlinks it from its parent and
//! siblings but keeps its slot, so NodeIds held by mapped elements stay
//! resolvable and `is_attached` can tell live nodes from removed ones.

use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode, DOCUMENT_NODE};
use super::strings::StringPool;
use super::{byte_index, char_len, DocumentAccess};
use crate::error::DomError;

/// A mutable XML document stored in arena format
#[derive(Debug)]
pub struct Document {
    /// Arena of nodes; index 0 is the document node
    nodes: Vec<XmlNode>,
    /// Interned names and namespace URIs
    pub strings: StringPool,
    /// Root element node ID (not document node)
    root_element: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the document node
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(256);
        nodes.push(XmlNode::document());
        Document {
            nodes,
            strings: StringPool::new(),
            root_element: None,
        }
    }

    /// Get the document node (index 0)
    pub fn document_node(&self) -> &XmlNode {
        &self.nodes[DOCUMENT_NODE as usize]
    }

    /// Get root element ID
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut XmlNode, DomError> {
        self.nodes.get_mut(id as usize).ok_or(DomError::UnknownNode(id))
    }

    fn node(&self, id: NodeId) -> Result<&XmlNode, DomError> {
        self.nodes.get(id as usize).ok_or(DomError::UnknownNode(id))
    }

    /// Total number of arena slots, detached nodes included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    /// Create a detached element. `namespace` is the resolved URI, if any.
    pub fn create_element(&mut self, qname: &str, namespace: Option<&str>) -> NodeId {
        let name_id = self.strings.intern(qname);
        let namespace_id = namespace.map(|ns| self.strings.intern(ns)).unwrap_or(0);
        self.push_node(XmlNode::element(name_id, namespace_id))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(XmlNode::text(text))
    }

    fn push_node(&mut self, node: XmlNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    // ------------------------------------------------------------------
    // Linking
    // ------------------------------------------------------------------

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if child == DOCUMENT_NODE {
            return Err(DomError::DocumentNode);
        }
        let node = self.node(child)?;
        if node.parent.is_some() {
            return Err(DomError::AlreadyAttached(child));
        }
        let parent_node = self.node(parent)?;
        if parent_node.kind == NodeKind::Text {
            return Err(DomError::NotElement(parent));
        }
        // parent must not live inside child
        let mut current = Some(parent);
        while let Some(id) = current {
            if id == child {
                return Err(DomError::Cycle { parent, child });
            }
            current = self.nodes[id as usize].parent;
        }
        Ok(())
    }

    /// Append a detached node as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insertable(parent, child)?;
        let last = self.nodes[parent as usize].last_child;
        self.link(parent, last, None, child);
        Ok(())
    }

    /// Insert a detached node immediately before `reference`
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent = self.node(reference)?.parent.ok_or(DomError::NoParent(reference))?;
        self.check_insertable(parent, child)?;
        let prev = self.nodes[reference as usize].prev_sibling;
        self.link(parent, prev, Some(reference), child);
        Ok(())
    }

    /// Insert a detached node immediately after `reference`
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent = self.node(reference)?.parent.ok_or(DomError::NoParent(reference))?;
        self.check_insertable(parent, child)?;
        let next = self.nodes[reference as usize].next_sibling;
        self.link(parent, Some(reference), next, child);
        Ok(())
    }

    fn link(&mut self, parent: NodeId, prev: Option<NodeId>, next: Option<NodeId>, child: NodeId) {
        {
            let node = &mut self.nodes[child as usize];
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        match prev {
            Some(p) => self.nodes[p as usize].next_sibling = Some(child),
            None => self.nodes[parent as usize].first_child = Some(child),
        }
        match next {
            Some(n) => self.nodes[n as usize].prev_sibling = Some(child),
            None => self.nodes[parent as usize].last_child = Some(child),
        }
        if parent == DOCUMENT_NODE
            && self.root_element.is_none()
            && self.nodes[child as usize].is_element()
        {
            self.root_element = Some(child);
        }
    }

    /// Unlink a node (and its subtree) from the tree. Detaching an already
    /// detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        if id == DOCUMENT_NODE {
            return Err(DomError::DocumentNode);
        }
        let (parent, prev, next) = {
            let node = self.node(id)?;
            match node.parent {
                Some(parent) => (parent, node.prev_sibling, node.next_sibling),
                None => return Ok(()),
            }
        };
        match prev {
            Some(p) => self.nodes[p as usize].next_sibling = next,
            None => self.nodes[parent as usize].first_child = next,
        }
        match next {
            Some(n) => self.nodes[n as usize].prev_sibling = prev,
            None => self.nodes[parent as usize].last_child = prev,
        }
        let node = &mut self.nodes[id as usize];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
        if self.root_element == Some(id) {
            self.root_element = None;
        }
        Ok(())
    }

    /// Move every child of `from` to the end of `to`, preserving order
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<(), DomError> {
        let children = self.children_vec(from);
        for child in children {
            self.detach(child)?;
            self.append_child(to, child)?;
        }
        Ok(())
    }

    /// True when the node is reachable from the document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == DOCUMENT_NODE {
                return true;
            }
            current = self.nodes.get(node_id as usize).and_then(|n| n.parent);
        }
        false
    }

    // ------------------------------------------------------------------
    // Attributes and text
    // ------------------------------------------------------------------

    /// Set (or replace) an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<(), DomError> {
        if !self.node(id)?.is_element() {
            return Err(DomError::NotElement(id));
        }
        let name_id = self.strings.intern(name);
        let value = value.into();
        let node = self.node_mut(id)?;
        match node.attributes.iter_mut().find(|a| a.name_id == name_id) {
            Some(attr) => attr.value = value,
            None => node.attributes.push(XmlAttribute::new(name_id, value)),
        }
        Ok(())
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let name_id = self.strings.lookup(name)?;
        let node = self.nodes.get_mut(id as usize)?;
        let pos = node.attributes.iter().position(|a| a.name_id == name_id)?;
        Some(node.attributes.remove(pos).value)
    }

    /// Get attribute value by name
    pub fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        let name_id = self.strings.lookup(name)?;
        self.get_node(node_id)?
            .attributes
            .iter()
            .find(|a| a.name_id == name_id)
            .map(|a| a.value.as_str())
    }

    /// Get all attribute names and values for a node
    pub fn get_attribute_values(&self, node_id: NodeId) -> Vec<(&str, &str)> {
        match self.get_node(node_id) {
            Some(node) => node
                .attributes
                .iter()
                .filter_map(|a| Some((self.strings.get_str(a.name_id)?, a.value.as_str())))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Get text content of a text node
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        node.is_text().then_some(node.text.as_str())
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        let node = self.node_mut(id)?;
        if !node.is_text() {
            return Err(DomError::NotText(id));
        }
        node.text = text.into();
        Ok(())
    }

    /// Split a text node at a char position. The node keeps the
    /// head; the returned node holds the tail and is inserted right after it.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> Result<NodeId, DomError> {
        let node = self.node(id)?;
        if !node.is_text() {
            return Err(DomError::NotText(id));
        }
        let len = char_len(&node.text);
        if at > len {
            return Err(DomError::SplitOutOfRange { node: id, at, len });
        }
        let split = byte_index(&node.text, at);
        let tail = self.nodes[id as usize].text.split_off(split);
        let tail_id = self.create_text(tail);
        if self.nodes[id as usize].parent.is_some() {
            self.insert_after(id, tail_id)?;
        }
        Ok(tail_id)
    }

    // ------------------------------------------------------------------
    // Iteration
    // ------------------------------------------------------------------

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Iterate over all descendants of a node (depth-first, document order)
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut stack = Vec::new();
        if let Some(node) = self.get_node(id) {
            let mut child_id = node.last_child;
            while let Some(cid) = child_id {
                stack.push(cid);
                child_id = self.get_node(cid).and_then(|n| n.prev_sibling);
            }
        }
        DescendantIter { doc: self, stack }
    }
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d Document,
    next: Option<NodeId>,
}

impl<'d> Iterator for ChildIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant nodes (depth-first)
pub struct DescendantIter<'d> {
    doc: &'d Document,
    stack: Vec<NodeId>,
}

impl<'d> Iterator for DescendantIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse so the first child is visited first
        if let Some(node) = self.doc.get_node(current) {
            let mut child_id = node.last_child;
            while let Some(id) = child_id {
                self.stack.push(id);
                child_id = self.doc.get_node(id).and_then(|n| n.prev_sibling);
            }
        }
        Some(current)
    }
}

// =============================================================================
// DocumentAccess trait implementation
// =============================================================================

impl DocumentAccess for Document {
    fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        if !node.is_element() {
            return None;
        }
        self.strings.get_str(node.name_id)
    }

    fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        if node.namespace_id == 0 {
            return None;
        }
        self.strings.get_str(node.namespace_id)
    }

    fn text_content(&self, id: NodeId) -> Option<&str> {
        Document::text_content(self, id)
    }

    fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        Document::get_attribute(self, node_id, name)
    }

    fn children_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }
}
