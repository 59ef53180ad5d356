//! Tree Traversal Primitives
//!
//! Axis walks (ancestor, following, preceding, siblings), document-order
//! comparison and a depth-first visitor. Everything is generic over
//! [`DocumentAccess`] so it works on any tree implementation.

use std::cmp::Ordering;

use super::node::{NodeId, NodeKind};
use super::DocumentAccess;

/// ancestor axis - parent, grandparent, ... up to and including the document node
pub fn ancestors<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;
    while let Some(parent) = doc.parent_of(current) {
        result.push(parent);
        current = parent;
    }
    result
}

/// ancestor-or-self axis
pub fn ancestor_or_self<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = vec![context];
    result.extend(ancestors(doc, context));
    result
}

/// Nearest strict ancestor matching `pred`
pub fn find_ancestor<D, F>(doc: &D, context: NodeId, pred: F) -> Option<NodeId>
where
    D: DocumentAccess,
    F: Fn(&D, NodeId) -> bool,
{
    let mut current = doc.parent_of(context);
    while let Some(id) = current {
        if pred(doc, id) {
            return Some(id);
        }
        current = doc.parent_of(id);
    }
    None
}

/// Nearest node matching `pred`, starting with `context` itself
pub fn find_ancestor_or_self<D, F>(doc: &D, context: NodeId, pred: F) -> Option<NodeId>
where
    D: DocumentAccess,
    F: Fn(&D, NodeId) -> bool,
{
    if pred(doc, context) {
        return Some(context);
    }
    find_ancestor(doc, context, pred)
}

/// True when `ancestor` is a strict ancestor of `node`
pub fn is_ancestor<D: DocumentAccess>(doc: &D, ancestor: NodeId, node: NodeId) -> bool {
    let mut current = doc.parent_of(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = doc.parent_of(id);
    }
    false
}

/// following-sibling axis
pub fn following_siblings<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut sibling = doc.next_sibling_of(context);
    while let Some(sib_id) = sibling {
        result.push(sib_id);
        sibling = doc.next_sibling_of(sib_id);
    }
    result
}

/// preceding-sibling axis (nearest first)
pub fn preceding_siblings<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut sibling = doc.prev_sibling_of(context);
    while let Some(sib_id) = sibling {
        result.push(sib_id);
        sibling = doc.prev_sibling_of(sib_id);
    }
    result
}

/// descendant axis in document order
pub fn descendants<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack: Vec<NodeId> = doc.children_vec(context).into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        result.push(current);
        stack.extend(doc.children_vec(current).into_iter().rev());
    }
    result
}

/// The first node after `context`'s subtree in document order
pub fn next_after_subtree<D: DocumentAccess>(doc: &D, context: NodeId) -> Option<NodeId> {
    let mut current = context;
    loop {
        if let Some(next) = doc.next_sibling_of(current) {
            return Some(next);
        }
        current = doc.parent_of(current)?;
    }
}

/// The next node in document order (descending into children first)
pub fn next_in_document_order<D: DocumentAccess>(doc: &D, context: NodeId) -> Option<NodeId> {
    doc.first_child_of(context)
        .or_else(|| next_after_subtree(doc, context))
}

/// following axis - nodes after `context` in document order, excluding its
/// descendants
pub fn following<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut next = next_after_subtree(doc, context);
    while let Some(id) = next {
        result.push(id);
        next = next_in_document_order(doc, id);
    }
    result
}

/// preceding axis - nodes before `context` in reverse document order,
/// excluding its ancestors
pub fn preceding<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    for node in ancestor_or_self(doc, context) {
        for sibling in preceding_siblings(doc, node) {
            let mut subtree = vec![sibling];
            subtree.extend(descendants(doc, sibling));
            result.extend(subtree.into_iter().rev());
        }
    }
    result
}

/// Compare two nodes by document order. Nodes in different (detached)
/// trees fall back to comparing their ids.
pub fn compare_document_order<D: DocumentAccess>(doc: &D, a: NodeId, b: NodeId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let mut path_a = ancestor_or_self(doc, a);
    let mut path_b = ancestor_or_self(doc, b);
    path_a.reverse();
    path_b.reverse();
    if path_a.first() != path_b.first() {
        return a.cmp(&b);
    }

    let common = path_a
        .iter()
        .zip(path_b.iter())
        .take_while(|(x, y)| x == y)
        .count();
    match (path_a.get(common), path_b.get(common)) {
        // a is an ancestor of b
        (None, _) => Ordering::Less,
        (_, None) => Ordering::Greater,
        (Some(&branch_a), Some(&branch_b)) => {
            let mut sibling = doc.next_sibling_of(branch_a);
            while let Some(id) = sibling {
                if id == branch_b {
                    return Ordering::Less;
                }
                sibling = doc.next_sibling_of(id);
            }
            Ordering::Greater
        }
    }
}

/// What a visitor wants after entering a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Visit the node's children, then call `leave`
    Continue,
    /// Do not visit children; `leave` is still called
    SkipChildren,
    /// Abort the whole walk
    Stop,
}

/// Depth-first visitor with enter/leave callbacks
pub trait Visitor<D: DocumentAccess> {
    type Error;

    fn enter(&mut self, doc: &D, node: NodeId) -> Result<Walk, Self::Error>;

    fn leave(&mut self, _doc: &D, _node: NodeId) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Walk `node` and its descendants in document order. Returns `false` if the
/// visitor stopped the walk early.
pub fn walk<D, V>(doc: &D, node: NodeId, visitor: &mut V) -> Result<bool, V::Error>
where
    D: DocumentAccess,
    V: Visitor<D>,
{
    match visitor.enter(doc, node)? {
        Walk::Stop => return Ok(false),
        Walk::SkipChildren => {}
        Walk::Continue => {
            let mut child = doc.first_child_of(node);
            while let Some(id) = child {
                // read the sibling first; the visitor never mutates the tree
                child = doc.next_sibling_of(id);
                if !walk(doc, id, visitor)? {
                    return Ok(false);
                }
            }
        }
    }
    visitor.leave(doc, node)?;
    Ok(true)
}

/// Readable path such as `/book/level[2]/p[1]/text()` for diagnostics
pub fn describe_path<D: DocumentAccess>(doc: &D, node: NodeId) -> String {
    let mut parts = Vec::new();
    for id in ancestor_or_self(doc, node) {
        let step = match doc.node_kind_of(id) {
            Some(NodeKind::Document) | None => continue,
            Some(NodeKind::Text) => "text()".to_string(),
            Some(NodeKind::Element) => {
                let name = doc.node_name(id).unwrap_or("?");
                let position = 1 + preceding_siblings(doc, id)
                    .into_iter()
                    .filter(|&s| doc.node_name(s) == Some(name))
                    .count();
                format!("{}[{}]", name, position)
            }
        };
        parts.push(step);
    }
    parts.reverse();
    format!("/{}", parts.join("/"))
}
