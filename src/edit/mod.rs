//! Edit protocol
//!
//! Every handler follows the same four steps:
//!
//! 1. mutate the tree
//! 2. patch the MapList to match (the span cache is left dirty)
//! 3. name the smallest subtree whose braille or layout could have changed
//!    in a [`ReformatRequest`]
//! 4. hand back a caret [`StableElementHandle`] that survives the rebuild
//!
//! Handlers validate before they mutate, so a failed edit leaves the tree
//! as it was. The session runs the engine, rebuilds the window and
//! re-anchors the caret afterwards.

pub mod content;
pub mod selection;
pub mod structure;
pub mod whitespace;

use crate::dom::{axes, Document, DocumentAccess, NodeId, DOCUMENT_NODE};
use crate::error::{DomError, EditError, NodeContextError};
use crate::init::block_of;
use crate::map::{ElementKind, MapList, MappedElement, StableElementHandle};
use crate::translate::ReformatRequest;
use crate::vocab::{self, kind};

pub use content::{adjust_tab, apply_style, edit_text};
pub use selection::{apply_emphasis, remove_selection};
pub use structure::{insert_element, merge_blocks, remove_element};
pub use whitespace::materialize_white_space;

/// Result of a successful handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub reformat: ReformatRequest,
    pub caret: StableElementHandle,
    /// Nodes created, changed or removed
    pub modified: Vec<NodeId>,
}

/// Where a new block goes relative to an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Before,
    After,
}

/// Node behind an element, for handlers that need one
fn anchor_at(list: &MapList, index: usize) -> Result<NodeId, EditError> {
    let element = list.element_at(index)?;
    element.anchor_node().ok_or(EditError::NotEditable {
        index,
        kind: element.kind.name(),
    })
}

/// Editable text node behind `index`
fn text_at(list: &MapList, index: usize) -> Result<NodeId, EditError> {
    let element = list.element_at(index)?;
    if element.read_only {
        return Err(EditError::ReadOnly { index });
    }
    match (&element.kind, element.node) {
        (ElementKind::Text, Some(node)) => Ok(node),
        _ => Err(EditError::NotEditable {
            index,
            kind: element.kind.name(),
        }),
    }
}

/// Layout block holding the element at `index`
fn block_at(doc: &Document, list: &MapList, index: usize) -> Result<NodeId, EditError> {
    let node = anchor_at(list, index)?;
    let recorded = list
        .element_at(index)?
        .block
        .filter(|&block| block == node || axes::is_ancestor(doc, block, node));
    recorded
        .or_else(|| block_of(doc, node))
        .ok_or_else(|| NodeContextError::new(doc, node, "element has no layout block").into())
}

/// Elements an edit may detach: not the root, not a section, still in the tree
fn removable(doc: &Document, id: NodeId) -> bool {
    id != DOCUMENT_NODE
        && doc.is_element(id)
        && Some(id) != doc.root_element_id()
        && !vocab::is_section(doc, id)
        && doc.is_attached(id)
}

/// Has a child other than generated braille
fn has_content(doc: &Document, id: NodeId) -> bool {
    doc.children(id).any(|child| !vocab::is_braille(doc, child))
}

/// Detach `id` together with the braille sibling generated for it
fn detach_with_braille(doc: &mut Document, id: NodeId) -> Result<(), DomError> {
    if let Some(next) = doc.next_sibling_of(id) {
        if vocab::is_brl(doc, next) {
            doc.detach(next)?;
        }
    }
    doc.detach(id)
}

/// Detach `start` and each ancestor left without content, stopping at a
/// section, the root or anything still holding content. Returns the node
/// the climb stopped at.
fn prune_empty(doc: &mut Document, start: NodeId) -> Result<NodeId, DomError> {
    let mut current = start;
    loop {
        if !removable(doc, current) || has_content(doc, current) {
            return Ok(current);
        }
        let parent = doc.parent_of(current);
        detach_with_braille(doc, current)?;
        match parent {
            Some(parent) => current = parent,
            None => return Ok(current),
        }
    }
}

/// Caret on the first candidate still in the tree
fn reanchor(doc: &Document, candidates: impl IntoIterator<Item = Option<NodeId>>) -> StableElementHandle {
    candidates
        .into_iter()
        .flatten()
        .find(|&node| doc.is_attached(node))
        .map(StableElementHandle::for_node)
        .unwrap_or_else(StableElementHandle::document_start)
}

/// Detached `<tag type="block">text</tag>`; returns the block and its text
fn new_block(doc: &mut Document, tag: &str, text: &str) -> Result<(NodeId, NodeId), DomError> {
    let block = doc.create_element(tag, None);
    doc.set_attribute(block, vocab::TYPE, kind::BLOCK)?;
    let text = doc.create_text(text);
    doc.append_child(block, text)?;
    Ok((block, text))
}

/// Text element for a node created by an edit
fn mapped_text(node: NodeId, like: &MappedElement, block: Option<NodeId>) -> MappedElement {
    let mut element = MappedElement::text(node, block);
    element.section = like.section;
    element
}

/// Point every element laid out in `from` at `to`
fn reassign_block(list: &mut MapList, from: NodeId, to: NodeId) -> Result<(), EditError> {
    let moved: Vec<usize> = list
        .iter()
        .enumerate()
        .filter(|(_, e)| e.block == Some(from))
        .map(|(i, _)| i)
        .collect();
    for index in moved {
        list.element_at_mut(index)?.block = Some(to);
    }
    Ok(())
}

/// Set a line-count attribute, dropping it when zero
fn set_lines(doc: &mut Document, block: NodeId, name: &str, lines: usize) -> Result<(), DomError> {
    if lines == 0 {
        doc.remove_attribute(block, name);
        Ok(())
    } else {
        doc.set_attribute(block, name, lines.to_string())
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use crate::config::ViewConfig;
    use crate::dom::Document;
    use crate::init::Initializer;
    use crate::map::MapList;
    use crate::view::set_white_space;

    /// Whole document laid out as one window
    pub fn window(xml: &str) -> (Document, MapList) {
        let doc = Document::parse(xml).unwrap();
        let list = relayout(&doc);
        (doc, list)
    }

    pub fn relayout(doc: &Document) -> MapList {
        let root = doc.root_element_id().unwrap();
        let sections = Initializer::new(&ViewConfig::default()).build(doc, root).unwrap();
        let content = sections.into_iter().flat_map(|s| s.elements).collect();
        let layout = set_white_space(doc, content, true, 8);
        let mut list = MapList::new();
        list.install(layout.elements, layout.spans, layout.print_len, layout.braille_len);
        list
    }

    pub fn print(doc: &Document) -> String {
        let list = relayout(doc);
        list.iter().map(|e| e.print_text(doc)).collect()
    }
}
