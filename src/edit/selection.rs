//! Selection edits
//!
//! A selection is a print-view range `[start, end)`. Whitespace markers and
//! read-only elements at either edge are trimmed off; what remains decides
//! whether the edit spans one block or two.

use tracing::debug;

use super::{block_at, detach_with_braille, mapped_text, prune_empty, reanchor, reassign_block, EditOutcome};
use crate::dom::{axes, Document, DocumentAccess, NodeId};
use crate::error::EditError;
use crate::map::{ElementKind, MapList, StableElementHandle, ViewRange};
use crate::translate::ReformatRequest;
use crate::vocab::{self, attr, kind};

/// Indices of the elements in `[start, end)` with the edges trimmed
fn selected(list: &MapList, start: usize, end: usize) -> Result<Vec<usize>, EditError> {
    let empty = EditError::EmptySelection { start, end };
    if start >= end {
        return Err(empty);
    }
    let indices: Vec<usize> = list.get_element_in_selected_range(start, end)?.into_iter().collect();
    let trimmable = |i: &usize| {
        let element = &list.elements()[*i];
        element.is_white_space() || element.read_only
    };
    let first = indices.iter().position(|i| !trimmable(i));
    let last = indices.iter().rposition(|i| !trimmable(i));
    match (first, last) {
        (Some(first), Some(last)) => Ok(indices[first..=last].to_vec()),
        _ => Err(empty),
    }
}

/// Part of a text element's range covered by the selection, in local chars
fn covered(range: ViewRange, start: usize, end: usize) -> (usize, usize) {
    let from = start.saturating_sub(range.start).min(range.len());
    let to = end.min(range.end).saturating_sub(range.start);
    (from, to)
}

struct Cut {
    node: NodeId,
    from: usize,
    to: usize,
    len: usize,
}

impl Cut {
    fn whole(&self) -> bool {
        self.from == 0 && self.to >= self.len
    }
}

/// Delete the selected content. When the selection runs from one block into
/// another, what is left of the second block is merged into the first.
pub fn remove_selection(doc: &mut Document, list: &mut MapList, start: usize, end: usize) -> Result<EditOutcome, EditError> {
    let indices = selected(list, start, end)?;
    let (first, last) = match (indices.first(), indices.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(EditError::EmptySelection { start, end }),
    };

    let mut cuts = Vec::new();
    for &index in &indices {
        let element = list.element_at(index)?;
        if element.is_white_space() {
            continue;
        }
        if element.read_only {
            return Err(EditError::ReadOnly { index });
        }
        match (&element.kind, element.node) {
            (ElementKind::Text, Some(node)) => {
                let range = list.span(index)?.print;
                let (from, to) = covered(range, start, end);
                cuts.push(Cut {
                    node,
                    from,
                    to,
                    len: range.len(),
                });
            }
            (ElementKind::Tab | ElementKind::Image, Some(node)) => cuts.push(Cut {
                node,
                from: 0,
                to: 0,
                len: 0,
            }),
            _ => {
                return Err(EditError::NotEditable {
                    index,
                    kind: element.kind.name(),
                })
            }
        }
    }

    let head = block_at(doc, list, first)?;
    let tail = block_at(doc, list, last)?;
    let two_blocks = head != tail && !axes::is_ancestor(doc, head, tail) && !axes::is_ancestor(doc, tail, head);
    let head_scope = axes::ancestor_or_self(doc, head);

    let node_of = |i: Option<usize>| i.and_then(|i| list.elements()[i].node);
    let caret_candidates = [
        list.elements()[first].node,
        list.elements()[last].node,
        node_of(list.find_previous_non_whitespace(first)),
        node_of(list.find_next_non_whitespace(last)),
    ];

    let mut emptied = Vec::new();
    let mut modified = Vec::new();
    for cut in &cuts {
        if cut.whole() {
            emptied.extend(doc.parent_of(cut.node));
            detach_with_braille(doc, cut.node)?;
        } else {
            let text = doc.text_content(cut.node).unwrap_or_default();
            let kept: String = text
                .chars()
                .take(cut.from)
                .chain(text.chars().skip(cut.to))
                .collect();
            doc.set_text(cut.node, kept)?;
        }
        modified.push(cut.node);
    }
    if two_blocks {
        doc.move_children(tail, head)?;
        emptied.push(tail);
        reassign_block(list, tail, head)?;
        modified.push(tail);
    }
    for parent in emptied {
        if doc.is_attached(parent) {
            prune_empty(doc, parent)?;
        }
    }
    list.retain_attached(doc);
    list.mark_dirty();

    let scope = head_scope
        .into_iter()
        .find(|&id| doc.is_attached(id))
        .unwrap_or(head);
    debug!(start, end, elements = indices.len(), two_blocks, scope, "remove_selection");
    Ok(EditOutcome {
        reformat: ReformatRequest::new(vec![scope], true),
        caret: reanchor(doc, caret_candidates),
        modified,
    })
}

/// Wrap the selected text in `<span type="inline" emphasis="...">`,
/// splitting text nodes at the selection edges
pub fn apply_emphasis(
    doc: &mut Document,
    list: &mut MapList,
    start: usize,
    end: usize,
    emphasis: &str,
) -> Result<EditOutcome, EditError> {
    let indices = selected(list, start, end)?;
    let mut targets = Vec::new();
    for &index in &indices {
        let element = list.element_at(index)?;
        if let (ElementKind::Text, Some(node), false) = (&element.kind, element.node, element.read_only) {
            targets.push((index, node, list.span(index)?.print));
        }
    }
    if targets.is_empty() {
        return Err(EditError::EmptySelection { start, end });
    }

    let mut wrapped = Vec::new();
    let mut blocks = Vec::new();
    // back to front so earlier indices stay put
    for (index, node, range) in targets.into_iter().rev() {
        let (from, to) = covered(range, start, end);
        if from >= to {
            continue;
        }
        let like = list.element_at(index)?.clone();
        if to < range.len() {
            let tail = doc.split_text(node, to)?;
            list.insert(index + 1, mapped_text(tail, &like, like.block))?;
        }
        let target = if from > 0 {
            let middle = doc.split_text(node, from)?;
            list.insert(index + 1, mapped_text(middle, &like, like.block))?;
            middle
        } else {
            node
        };

        let span = doc.create_element(kind::SPAN, None);
        doc.set_attribute(span, vocab::TYPE, kind::INLINE)?;
        doc.set_attribute(span, attr::EMPHASIS, emphasis)?;
        doc.insert_before(target, span)?;
        doc.detach(target)?;
        doc.append_child(span, target)?;

        wrapped.push(target);
        let block = like.block.unwrap_or(span);
        if !blocks.contains(&block) {
            blocks.push(block);
        }
    }
    if wrapped.is_empty() {
        return Err(EditError::EmptySelection { start, end });
    }
    list.mark_dirty();
    debug!(start, end, emphasis, wrapped = wrapped.len(), "apply_emphasis");
    wrapped.reverse();
    Ok(EditOutcome {
        reformat: ReformatRequest::new(blocks, true),
        caret: StableElementHandle::for_node(wrapped[wrapped.len() - 1]),
        modified: wrapped,
    })
}
