//! Stable cursor handles
//!
//! A handle names a mapped element by identity rather than position: a
//! node-backed element by its node, a node-less element (whitespace marker,
//! closing box line) by the nearest preceding node-backed element plus how
//! many node-less elements follow it. The stored index is only a hint.
//! Resolution against a list that no longer contains the target yields
//! `None`, which callers surface as a stale handle.

use super::element::MappedElement;
use crate::dom::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Anchor {
    Node(NodeId),
    Unbacked { after: Option<NodeId>, ordinal: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StableElementHandle {
    anchor: Anchor,
    hint: usize,
}

impl StableElementHandle {
    /// Handle for the element backed by `node`
    pub fn for_node(node: NodeId) -> Self {
        StableElementHandle {
            anchor: Anchor::Node(node),
            hint: 0,
        }
    }

    /// Handle for the first element of whatever list it is resolved against
    pub fn document_start() -> Self {
        StableElementHandle {
            anchor: Anchor::Unbacked {
                after: None,
                ordinal: 0,
            },
            hint: 0,
        }
    }

    /// Handle naming `elements[index]`
    pub fn at(elements: &[MappedElement], index: usize) -> Option<Self> {
        let element = elements.get(index)?;
        let anchor = match element.node {
            Some(node) => Anchor::Node(node),
            None => {
                let base = elements[..index].iter().rposition(|e| e.node.is_some());
                let ordinal = match base {
                    Some(b) => index - b - 1,
                    None => index,
                };
                Anchor::Unbacked {
                    after: base.and_then(|b| elements[b].node),
                    ordinal,
                }
            }
        };
        Some(StableElementHandle {
            anchor,
            hint: index,
        })
    }

    /// The backing node, for node-backed handles
    pub fn node(&self) -> Option<NodeId> {
        match self.anchor {
            Anchor::Node(node) => Some(node),
            Anchor::Unbacked { .. } => None,
        }
    }

    /// The node the handle is positioned relative to
    pub fn reference_node(&self) -> Option<NodeId> {
        match self.anchor {
            Anchor::Node(node) => Some(node),
            Anchor::Unbacked { after, .. } => after,
        }
    }

    pub fn hint(&self) -> usize {
        self.hint
    }

    /// Current index of the named element
    pub fn resolve(&self, elements: &[MappedElement]) -> Option<usize> {
        match self.anchor {
            Anchor::Node(node) => find_node(elements, node, self.hint),
            Anchor::Unbacked { after, ordinal } => {
                let first = match after {
                    Some(node) => find_node(elements, node, self.hint.saturating_sub(ordinal + 1))? + 1,
                    None => 0,
                };
                let target = first + ordinal;
                let run = elements.get(first..=target)?;
                run.iter().all(|e| e.node.is_none()).then_some(target)
            }
        }
    }

    /// Same element, refreshed hint
    pub fn refreshed(self, elements: &[MappedElement]) -> Option<Self> {
        let index = self.resolve(elements)?;
        Some(StableElementHandle { hint: index, ..self })
    }
}

fn find_node(elements: &[MappedElement], node: NodeId, hint: usize) -> Option<usize> {
    if elements.get(hint).and_then(|e| e.node) == Some(node) {
        return Some(hint);
    }
    elements.iter().position(|e| e.node == Some(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::element::{Filler, WhiteSpaceKind};

    fn marker() -> MappedElement {
        MappedElement::white_space(WhiteSpaceKind::LineBreak, Filler::LineBreak, None, 0)
    }

    fn list() -> Vec<MappedElement> {
        vec![
            marker(),
            MappedElement::text(10, None),
            marker(),
            marker(),
            MappedElement::text(20, None),
        ]
    }

    #[test]
    fn test_node_handle_survives_shift() {
        let mut elements = list();
        let handle = StableElementHandle::at(&elements, 4).unwrap();
        assert_eq!(handle.node(), Some(20));
        elements.insert(0, MappedElement::text(5, None));
        assert_eq!(handle.resolve(&elements), Some(5));
    }

    #[test]
    fn test_marker_handle() {
        let mut elements = list();
        let handle = StableElementHandle::at(&elements, 3).unwrap();
        assert_eq!(handle.node(), None);
        assert_eq!(handle.reference_node(), Some(10));
        assert_eq!(handle.resolve(&elements), Some(3));
        elements.remove(0);
        assert_eq!(handle.resolve(&elements), Some(2));
        // the run after node 10 shrinks to one marker
        elements.remove(1);
        assert_eq!(handle.resolve(&elements), None);
    }

    #[test]
    fn test_leading_marker_handle() {
        let elements = list();
        let handle = StableElementHandle::at(&elements, 0).unwrap();
        assert_eq!(handle, StableElementHandle::document_start());
        assert_eq!(handle.resolve(&elements), Some(0));
        assert_eq!(handle.resolve(&[]), None);
    }

    #[test]
    fn test_removed_node_is_stale() {
        let mut elements = list();
        let handle = StableElementHandle::at(&elements, 1).unwrap();
        elements.remove(1);
        assert_eq!(handle.resolve(&elements), None);
    }
}
