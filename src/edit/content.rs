//! In-place edits: text content, block style, tab column

use tracing::debug;

use super::{block_at, text_at, EditOutcome};
use crate::dom::{char_len, Document};
use crate::error::EditError;
use crate::map::{ElementKind, MapList, StableElementHandle};
use crate::translate::ReformatRequest;
use crate::vocab::attr;

/// Replace the content of the text node behind `index`
pub fn edit_text(doc: &mut Document, list: &mut MapList, index: usize, text: &str) -> Result<EditOutcome, EditError> {
    let node = text_at(list, index)?;
    let block = block_at(doc, list, index)?;
    doc.set_text(node, text)?;
    list.mark_dirty();
    debug!(index, node, chars = char_len(text), "edit_text");
    Ok(EditOutcome {
        reformat: ReformatRequest::new(vec![block], true),
        caret: StableElementHandle::for_node(node),
        modified: vec![node],
    })
}

/// Set the named style of the block holding `index`
pub fn apply_style(doc: &mut Document, list: &mut MapList, index: usize, style: &str) -> Result<EditOutcome, EditError> {
    if list.element_at(index)?.read_only {
        return Err(EditError::ReadOnly { index });
    }
    let block = block_at(doc, list, index)?;
    doc.set_attribute(block, attr::STYLE, style)?;
    debug!(index, block, style, "apply_style");
    Ok(EditOutcome {
        reformat: ReformatRequest::new(vec![block], false),
        caret: StableElementHandle::at(list.elements(), index).unwrap_or_else(StableElementHandle::document_start),
        modified: vec![block],
    })
}

/// Move the tab at `index` to `column`
pub fn adjust_tab(doc: &mut Document, list: &mut MapList, index: usize, column: usize) -> Result<EditOutcome, EditError> {
    let element = list.element_at(index)?;
    let node = match (&element.kind, element.node) {
        (ElementKind::Tab, Some(node)) => node,
        _ => {
            return Err(EditError::NotEditable {
                index,
                kind: element.kind.name(),
            })
        }
    };
    let block = block_at(doc, list, index)?;
    doc.set_attribute(node, attr::TAB_VALUE, column.to_string())?;
    list.mark_dirty();
    debug!(index, node, column, "adjust_tab");
    Ok(EditOutcome {
        reformat: ReformatRequest::new(vec![block], false),
        caret: StableElementHandle::for_node(node),
        modified: vec![node],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DocumentAccess;
    use crate::edit::fixture::{print, window};

    #[test]
    fn test_edit_text_replaces_content() {
        let (mut doc, mut list) = window(r#"<book><p type="block">old</p><p type="block">two</p></book>"#);
        let outcome = edit_text(&mut doc, &mut list, 0, "brand new").unwrap();
        assert_eq!(print(&doc), "brand new\ntwo");
        assert!(list.is_dirty());
        assert!(outcome.reformat.retranslate);
        assert_eq!(outcome.caret.node(), list.element_at(0).unwrap().node);
    }

    #[test]
    fn test_edit_text_rejects_read_only() {
        let (mut doc, mut list) = window(
            r#"<book><g type="container" subtype="spatialGrid"><p type="block">fixed</p></g></book>"#,
        );
        let err = edit_text(&mut doc, &mut list, 0, "x").unwrap_err();
        assert!(matches!(err, EditError::ReadOnly { index: 0 }));
        assert_eq!(print(&doc), "fixed");
    }

    #[test]
    fn test_edit_text_rejects_markers() {
        let (mut doc, mut list) =
            window(r#"<book><p type="block">a</p><p type="block">b</p></book>"#);
        assert!(list.element_at(1).unwrap().is_white_space());
        let err = edit_text(&mut doc, &mut list, 1, "x").unwrap_err();
        assert!(matches!(err, EditError::NotEditable { index: 1, .. }));
    }

    #[test]
    fn test_apply_style_sets_block_attribute() {
        let (mut doc, mut list) = window(r#"<book><p type="block">a</p></book>"#);
        let outcome = apply_style(&mut doc, &mut list, 0, "heading1").unwrap();
        let block = outcome.reformat.nodes[0];
        assert_eq!(doc.get_attribute(block, "style"), Some("heading1"));
        assert!(!outcome.reformat.retranslate);
    }

    #[test]
    fn test_adjust_tab_moves_gap() {
        let (mut doc, mut list) =
            window(r#"<book><p type="block">ab<span type="span" subtype="tab"/>cd</p></book>"#);
        assert_eq!(print(&doc), "ab      cd");
        let tab = list.iter().position(|e| e.kind == ElementKind::Tab).unwrap();
        adjust_tab(&mut doc, &mut list, tab, 4).unwrap();
        assert_eq!(print(&doc), "ab  cd");
        let err = adjust_tab(&mut doc, &mut list, 0, 4).unwrap_err();
        assert!(matches!(err, EditError::NotEditable { kind: "text", .. }));
    }
}
