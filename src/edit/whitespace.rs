//! Turning layout whitespace into content
//!
//! Typing into a run of whitespace markers creates a real block there. The
//! blank lines the run stood for are rewritten as block attributes so the
//! layout reproduces them: the breaks before the caret go to the previous
//! block's `linesAfter` (or to the new block's `linesBefore` at document
//! start), the breaks from the caret on go to the new block's `linesAfter`.

use tracing::debug;

use super::{block_at, mapped_text, new_block, set_lines, EditOutcome};
use crate::dom::{Document, DocumentAccess};
use crate::error::EditError;
use crate::map::{MapList, StableElementHandle, View, WhiteSpaceKind};
use crate::translate::ReformatRequest;
use crate::vocab::attr;

const DEFAULT_TAG: &str = "p";

fn white_space_error(index: usize, list: &MapList, reason: &str) -> EditError {
    let mode = list.elements()[index]
        .white_space_kind()
        .unwrap_or(WhiteSpaceKind::LineBreak);
    EditError::WhiteSpace {
        index,
        mode,
        reason: reason.to_string(),
    }
}

/// Create a block holding `text` in the whitespace at print `offset`
pub fn materialize_white_space(
    doc: &mut Document,
    list: &mut MapList,
    offset: usize,
    text: &str,
) -> Result<EditOutcome, EditError> {
    if list.is_empty() {
        return Err(EditError::EmptySelection {
            start: offset,
            end: offset,
        });
    }
    let index = list.find_closest(offset, View::Print, 0, list.len() - 1)?;
    let element = list.element_at(index)?;
    let Some(mode) = element.white_space_kind() else {
        return Err(EditError::NotEditable {
            index,
            kind: element.kind.name(),
        });
    };
    if !mode.is_editable() {
        return Err(white_space_error(index, list, "marker is not editable"));
    }

    let mut run_first = index;
    while run_first > 0 && list.elements()[run_first - 1].is_white_space() {
        run_first -= 1;
    }
    let mut run_last = index;
    while run_last + 1 < list.len() && list.elements()[run_last + 1].is_white_space() {
        run_last += 1;
    }
    let prev = run_first.checked_sub(1);
    let next = (run_last + 1 < list.len()).then_some(run_last + 1);

    let mut before = 0usize;
    let mut after = 0usize;
    let mut split = run_first;
    for i in run_first..=run_last {
        if !list.elements()[i].is_line_break() {
            continue;
        }
        if list.span(i)?.print.start < offset {
            before += 1;
            split = i + 1;
        } else {
            after += 1;
        }
    }
    if before == 0 && prev.is_some() {
        return Err(white_space_error(index, list, "no line break before the insertion point"));
    }
    if after == 0 && next.is_some() {
        return Err(white_space_error(index, list, "no line break after the insertion point"));
    }

    let prev_block = prev.map(|i| block_at(doc, list, i)).transpose()?;
    let next_block = next.map(|i| block_at(doc, list, i)).transpose()?;
    let tag = prev_block
        .or(next_block)
        .and_then(|block| doc.node_name(block))
        .unwrap_or(DEFAULT_TAG)
        .to_string();
    let like = list.element_at(index)?.clone();

    let (created, text_node) = new_block(doc, &tag, text)?;
    match (prev_block, next_block) {
        (Some(prev), _) => doc.insert_after(prev, created)?,
        (None, Some(next)) => doc.insert_before(next, created)?,
        (None, None) => {
            let root = doc
                .root_element_id()
                .ok_or_else(|| white_space_error(index, list, "document has no root element"))?;
            doc.append_child(root, created)?;
        }
    }

    match prev_block {
        Some(prev) => set_lines(doc, prev, attr::LINES_AFTER, before - 1)?,
        None => set_lines(doc, created, attr::LINES_BEFORE, before)?,
    }
    set_lines(doc, created, attr::LINES_AFTER, after.saturating_sub(1))?;
    if let Some(next) = next_block {
        doc.remove_attribute(next, attr::LINES_BEFORE);
    }

    list.insert(split, mapped_text(text_node, &like, Some(created)))?;
    debug!(offset, index, before, after, created, %mode, "materialize_white_space");

    let mut modified = vec![created];
    modified.extend(prev_block.into_iter().chain(next_block));
    Ok(EditOutcome {
        reformat: ReformatRequest::new(vec![created], true),
        caret: StableElementHandle::for_node(text_node),
        modified,
    })
}
