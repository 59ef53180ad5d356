//! Document Vocabulary
//!
//! Attribute and element names the core reads when classifying nodes and
//! laying out blocks, plus small typed accessors over them.

use crate::dom::{DocumentAccess, NodeId, NodeKind};

/// Structural role attribute
pub const TYPE: &str = "type";
/// Refinement of the structural role
pub const SUBTYPE: &str = "subtype";

/// Values of the `type` attribute
pub mod kind {
    pub const SECTION: &str = "section";
    pub const CONTAINER: &str = "container";
    pub const BLOCK: &str = "block";
    pub const INLINE: &str = "inline";
    pub const SPAN: &str = "span";
}

/// Values of the `subtype` attribute
pub mod subtype {
    pub const TABLE: &str = "table";
    pub const BOX: &str = "box";
    pub const SPATIAL_GRID: &str = "spatialGrid";
    pub const NUMBER_LINE: &str = "numberLine";
    pub const MATRIX: &str = "matrix";
    pub const TEMPLATE: &str = "template";
    pub const PAGE_NUM: &str = "pageNum";
    pub const TAB: &str = "tab";
    pub const IMAGE: &str = "image";
}

/// Style and layout attributes
pub mod attr {
    pub const LINES_BEFORE: &str = "linesBefore";
    pub const LINES_AFTER: &str = "linesAfter";
    pub const INDENT: &str = "indent";
    pub const STYLE: &str = "style";
    pub const TAB_VALUE: &str = "tabValue";
    pub const TABLE_TYPE: &str = "tableType";
    pub const EMPHASIS: &str = "emphasis";
}

/// Values of `tableType`
pub mod table_type {
    pub const SIMPLE: &str = "simple";
    pub const COMPLEX: &str = "complex";
    pub const LISTED: &str = "listed";
    pub const TN: &str = "tn";
}

/// Namespace of generated braille content
pub const BRAILLE_NS: &str = "urn:dualview:braille";
/// Conventional prefix for [`BRAILLE_NS`]
pub const BRAILLE_PREFIX: &str = "utd";

/// Local names in the braille namespace
pub mod braille {
    pub const BRL: &str = "brl";
    pub const PAGE_NUM: &str = "brlPageNum";
    pub const GUIDE_WORD: &str = "guideWord";
    pub const UNCONTRACTED: &str = "uncontracted";
    pub const PRONUNCIATION: &str = "pronunciation";
    pub const NEW_PAGE: &str = "newPage";
    pub const MOVE_TO: &str = "moveTo";
}

pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";
pub const MATH: &str = "math";

pub fn node_type<D: DocumentAccess>(doc: &D, id: NodeId) -> Option<&str> {
    doc.get_attribute(id, TYPE)
}

pub fn node_subtype<D: DocumentAccess>(doc: &D, id: NodeId) -> Option<&str> {
    doc.get_attribute(id, SUBTYPE)
}

pub fn is_block<D: DocumentAccess>(doc: &D, id: NodeId) -> bool {
    node_type(doc, id) == Some(kind::BLOCK)
}

pub fn is_section<D: DocumentAccess>(doc: &D, id: NodeId) -> bool {
    node_type(doc, id) == Some(kind::SECTION)
}

/// Element in the braille namespace
pub fn is_braille<D: DocumentAccess>(doc: &D, id: NodeId) -> bool {
    doc.is_element(id) && doc.namespace_uri(id) == Some(BRAILLE_NS)
}

/// A `brl` element holding generated braille
pub fn is_brl<D: DocumentAccess>(doc: &D, id: NodeId) -> bool {
    is_braille(doc, id) && doc.node_local_name(id) == Some(braille::BRL)
}

pub fn is_tab<D: DocumentAccess>(doc: &D, id: NodeId) -> bool {
    node_type(doc, id) == Some(kind::SPAN) && node_subtype(doc, id) == Some(subtype::TAB)
}

/// Parse a non-negative integer attribute; malformed values read as absent
pub fn attr_usize<D: DocumentAccess>(doc: &D, id: NodeId, name: &str) -> Option<usize> {
    doc.get_attribute(id, name)?.trim().parse().ok()
}

/// Layout attributes of a block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStyle {
    pub lines_before: usize,
    pub lines_after: usize,
    pub indent: usize,
}

impl BlockStyle {
    pub fn of<D: DocumentAccess>(doc: &D, block: Option<NodeId>) -> Self {
        match block {
            Some(id) => BlockStyle {
                lines_before: attr_usize(doc, id, attr::LINES_BEFORE).unwrap_or(0),
                lines_after: attr_usize(doc, id, attr::LINES_AFTER).unwrap_or(0),
                indent: attr_usize(doc, id, attr::INDENT).unwrap_or(0),
            },
            None => BlockStyle::default(),
        }
    }
}

/// Concatenated print text beneath `node`, skipping generated braille
pub fn print_text<D: DocumentAccess>(doc: &D, node: NodeId) -> String {
    let mut out = String::new();
    if let Some(text) = doc.text_content(node) {
        out.push_str(text);
        return out;
    }
    let mut stack: Vec<NodeId> = doc.children_vec(node).into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        match doc.node_kind_of(current) {
            Some(NodeKind::Text) => out.push_str(doc.text_content(current).unwrap_or_default()),
            Some(NodeKind::Element) if !is_braille(doc, current) => {
                stack.extend(doc.children_vec(current).into_iter().rev());
            }
            _ => {}
        }
    }
    out
}

/// All text beneath `node`, braille included
pub fn all_text<D: DocumentAccess>(doc: &D, node: NodeId) -> String {
    let mut out = String::new();
    if let Some(text) = doc.text_content(node) {
        out.push_str(text);
        return out;
    }
    for id in crate::dom::axes::descendants(doc, node) {
        if let Some(text) = doc.text_content(id) {
            out.push_str(text);
        }
    }
    out
}
