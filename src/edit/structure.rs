//! Block-level edits: insert, remove, merge

use tracing::debug;

use super::{
    anchor_at, block_at, detach_with_braille, mapped_text, new_block, prune_empty, reanchor, reassign_block,
    removable, EditOutcome, Position,
};
use crate::dom::{axes, Document, DocumentAccess, NodeId};
use crate::error::{EditError, NodeContextError};
use crate::map::{MapList, StableElementHandle};
use crate::translate::ReformatRequest;
use crate::vocab;

/// Insert `<tag type="block">text</tag>` before or after the block holding
/// `index`
pub fn insert_element(
    doc: &mut Document,
    list: &mut MapList,
    index: usize,
    position: Position,
    tag: &str,
    text: &str,
) -> Result<EditOutcome, EditError> {
    let block = block_at(doc, list, index)?;
    if !removable(doc, block) {
        return Err(NodeContextError::new(doc, block, "cannot insert beside the root or a section").into());
    }
    let (first, last) = list.find_text_map_element_range(doc, index, block)?;
    let like = list.element_at(index)?.clone();

    let (created, text_node) = new_block(doc, tag, text)?;
    match position {
        Position::Before => doc.insert_before(block, created)?,
        Position::After => {
            // keep a block-level braille sibling with its block
            let reference = doc
                .next_sibling_of(block)
                .filter(|&next| vocab::is_brl(doc, next))
                .unwrap_or(block);
            doc.insert_after(reference, created)?;
        }
    }
    let at = match position {
        Position::Before => first,
        Position::After => last + 1,
    };
    list.insert(at, mapped_text(text_node, &like, Some(created)))?;
    debug!(index, ?position, tag, block, created, "insert_element");
    Ok(EditOutcome {
        reformat: ReformatRequest::new(vec![created], true),
        caret: StableElementHandle::for_node(text_node),
        modified: vec![created],
    })
}

/// Remove the block holding `index`, then every ancestor it leaves empty up
/// to a section or the root
pub fn remove_element(doc: &mut Document, list: &mut MapList, index: usize) -> Result<EditOutcome, EditError> {
    if list.element_at(index)?.read_only {
        return Err(EditError::ReadOnly { index });
    }
    let node = anchor_at(list, index)?;
    let block = block_at(doc, list, index)?;
    // a root-level run of text has no block of its own to drop
    let target = if removable(doc, block) { block } else { node };
    let (first, last) = list.find_text_map_element_range(doc, index, target)?;

    let node_of = |i: Option<usize>| i.and_then(|i| list.elements()[i].node);
    let caret_candidates = [
        node_of(list.find_previous_non_whitespace(first)),
        node_of(list.find_next_non_whitespace(last)),
    ];

    let parent = doc.parent_of(target);
    detach_with_braille(doc, target)?;
    let scope = match parent {
        Some(parent) => prune_empty(doc, parent)?,
        None => target,
    };
    list.remove_range(first, last)?;
    let cascaded = list.retain_attached(doc);
    debug!(index, target, scope, removed = last - first + 1 + cascaded, "remove_element");
    Ok(EditOutcome {
        reformat: ReformatRequest::new(vec![scope], false),
        caret: reanchor(doc, caret_candidates),
        modified: vec![target],
    })
}

/// Block after `block`: from the live list when it is loaded, from the
/// tree otherwise
fn next_block(doc: &Document, list: &MapList, block: NodeId, last: usize) -> Result<Option<NodeId>, EditError> {
    if let Some(next) = list.find_next_non_whitespace(last) {
        if list.element_at(next)?.read_only {
            return Err(EditError::ReadOnly { index: next });
        }
        return block_at(doc, list, next).map(Some);
    }
    Ok(axes::following(doc, block)
        .into_iter()
        .find(|&id| vocab::is_block(doc, id)))
}

/// Move the content of the next block into the block holding `index`
pub fn merge_blocks(doc: &mut Document, list: &mut MapList, index: usize) -> Result<EditOutcome, EditError> {
    if list.element_at(index)?.read_only {
        return Err(EditError::ReadOnly { index });
    }
    let block = block_at(doc, list, index)?;
    let (_, last) = list.find_text_map_element_range(doc, index, block)?;
    let next = next_block(doc, list, block, last)?
        .filter(|&next| next != block && !axes::is_ancestor(doc, next, block) && !axes::is_ancestor(doc, block, next))
        .ok_or(EditError::NothingToMerge { index })?;

    // caret lands at the join
    let join = list
        .find_next_non_whitespace(last)
        .and_then(|i| list.elements()[i].node)
        .or(list.elements()[index].node);

    doc.move_children(next, block)?;
    let scope = prune_empty(doc, next)?;
    reassign_block(list, next, block)?;
    list.retain_attached(doc);
    debug!(index, block, merged = next, scope, "merge_blocks");
    Ok(EditOutcome {
        reformat: ReformatRequest::new(vec![block], true),
        caret: reanchor(doc, [join]),
        modified: vec![block, next],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::fixture::{print, window};

    #[test]
    fn test_insert_before_and_after() {
        let (mut doc, mut list) = window(r#"<book><p type="block">mid</p></book>"#);
        let outcome = insert_element(&mut doc, &mut list, 0, Position::After, "p", "end").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.elements()[1].node, outcome.caret.node());
        insert_element(&mut doc, &mut list, 0, Position::Before, "h1", "top").unwrap();
        assert_eq!(print(&doc), "top\nmid\nend");
        assert!(doc.to_xml().contains(r#"<h1 type="block">top</h1>"#));
    }

    #[test]
    fn test_insert_after_skips_block_braille() {
        let (mut doc, mut list) = window(
            r#"<book xmlns:utd="urn:dualview:braille"><p type="block">a</p><utd:brl>A</utd:brl></book>"#,
        );
        insert_element(&mut doc, &mut list, 0, Position::After, "p", "b").unwrap();
        let xml = doc.to_xml();
        assert!(xml.find("<utd:brl>").unwrap() < xml.find(">b<").unwrap());
    }

    #[test]
    fn test_insert_beside_root_rejected() {
        let (mut doc, mut list) = window("<book>loose</book>");
        let err = insert_element(&mut doc, &mut list, 0, Position::After, "p", "x").unwrap_err();
        assert!(matches!(err, EditError::NodeContext(_)));
    }

    #[test]
    fn test_remove_cascades_to_section() {
        let (mut doc, mut list) = window(
            r#"<book><s type="section"><d type="container"><d type="container"><p type="block">only</p></d></d><p type="block">keep</p></s></book>"#,
        );
        let outcome = remove_element(&mut doc, &mut list, 0).unwrap();
        assert!(vocab::is_section(&doc, outcome.reformat.nodes[0]));
        assert_eq!(
            doc.to_xml(),
            r#"<book><s type="section"><p type="block">keep</p></s></book>"#
        );
        let remaining: Vec<_> = list.iter().filter(|e| !e.is_white_space()).collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(outcome.caret.node(), remaining[0].node);
    }

    #[test]
    fn test_remove_never_takes_root() {
        let (mut doc, mut list) =
            window(r#"<book><d type="container"><p type="block">only</p></d></book>"#);
        let outcome = remove_element(&mut doc, &mut list, 0).unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(outcome.reformat.nodes, vec![root]);
        assert_eq!(doc.to_xml(), "<book/>");
        assert!(list.is_empty());
        assert_eq!(outcome.caret, StableElementHandle::document_start());
    }

    #[test]
    fn test_remove_block_drops_all_its_elements() {
        let (mut doc, mut list) = window(
            r#"<book><p type="block">a<span type="inline">b</span>c</p><p type="block">d</p></book>"#,
        );
        remove_element(&mut doc, &mut list, 1).unwrap();
        assert_eq!(print(&doc), "d");
        assert!(list.iter().all(|e| e.is_white_space() || doc.is_attached(e.node.unwrap())));
    }

    #[test]
    fn test_merge_next_block() {
        let (mut doc, mut list) =
            window(r#"<book><p type="block">one </p><p type="block">two</p><p type="block">three</p></book>"#);
        let outcome = merge_blocks(&mut doc, &mut list, 0).unwrap();
        assert_eq!(print(&doc), "one two\nthree");
        let joined = outcome.caret.node().unwrap();
        assert_eq!(doc.text_content(joined), Some("two"));
        let block = outcome.reformat.nodes[0];
        assert!(list.iter().filter(|e| !e.is_white_space()).take(2).all(|e| e.block == Some(block)));
    }

    #[test]
    fn test_merge_last_block_fails() {
        let (mut doc, mut list) = window(r#"<book><p type="block">only</p></book>"#);
        let err = merge_blocks(&mut doc, &mut list, 0).unwrap_err();
        assert!(matches!(err, EditError::NothingToMerge { index: 0 }));
    }
}
