//! Node classification
//!
//! Each node is reduced once to a [`NodeFacts`] record and resolved to a
//! single [`NodeClass`] by walking a priority-ordered matcher table. The
//! first matcher that applies wins, so the order of [`MATCHERS`] is the
//! precedence between overlapping rules (a braille element that also looks
//! like a table is still braille).

use crate::dom::{DocumentAccess, NodeId, NodeKind};
use crate::vocab::{self, kind, subtype, table_type};

/// What the Initializer does with a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// Generated braille; handled by the sibling walk
    Braille,
    /// Spatial layouts and non-simple tables; descend in read-only mode
    ReadOnlyContainer,
    /// One table element with its cells
    SimpleTable,
    /// A tab directly after another tab
    CollapsedTab,
    Tab,
    Math,
    Image,
    PageIndicator,
    /// Box rules around the children
    BoxContainer,
    Text,
    /// Descend into children
    Container,
}

/// Facts about a node that classification depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFacts<'a> {
    pub kind: NodeKind,
    pub braille: bool,
    pub mathml: bool,
    pub local_name: Option<&'a str>,
    pub node_type: Option<&'a str>,
    pub subtype: Option<&'a str>,
    pub table_type: Option<&'a str>,
    /// Previous sibling is a tab span
    pub follows_tab: bool,
}

impl<'a> NodeFacts<'a> {
    pub fn extract<D: DocumentAccess>(doc: &'a D, id: NodeId) -> Option<Self> {
        let kind = doc.node_kind_of(id)?;
        let element = kind == NodeKind::Element;
        Some(NodeFacts {
            kind,
            braille: element && doc.namespace_uri(id) == Some(vocab::BRAILLE_NS),
            mathml: element && doc.namespace_uri(id) == Some(vocab::MATHML_NS),
            local_name: doc.node_local_name(id),
            node_type: vocab::node_type(doc, id),
            subtype: vocab::node_subtype(doc, id),
            table_type: doc.get_attribute(id, vocab::attr::TABLE_TYPE),
            follows_tab: doc
                .prev_sibling_of(id)
                .is_some_and(|prev| vocab::is_tab(doc, prev)),
        })
    }

    fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    fn is_table(&self) -> bool {
        self.is_element() && self.subtype == Some(subtype::TABLE)
    }

    fn is_tab(&self) -> bool {
        self.is_element() && self.node_type == Some(kind::SPAN) && self.subtype == Some(subtype::TAB)
    }
}

pub struct Matcher {
    pub class: NodeClass,
    pub applies: fn(&NodeFacts<'_>) -> bool,
}

/// Classification rules, highest priority first
pub const MATCHERS: &[Matcher] = &[
    Matcher {
        class: NodeClass::Braille,
        applies: |f| f.braille,
    },
    Matcher {
        class: NodeClass::ReadOnlyContainer,
        applies: |f| {
            f.is_element()
                && matches!(
                    f.subtype,
                    Some(subtype::SPATIAL_GRID | subtype::NUMBER_LINE | subtype::MATRIX | subtype::TEMPLATE)
                )
        },
    },
    Matcher {
        class: NodeClass::ReadOnlyContainer,
        applies: |f| {
            f.is_table()
                && matches!(
                    f.table_type,
                    Some(table_type::COMPLEX | table_type::LISTED | table_type::TN)
                )
        },
    },
    Matcher {
        class: NodeClass::SimpleTable,
        applies: |f| f.is_table(),
    },
    Matcher {
        class: NodeClass::CollapsedTab,
        applies: |f| f.is_tab() && f.follows_tab,
    },
    Matcher {
        class: NodeClass::Tab,
        applies: |f| f.is_tab(),
    },
    Matcher {
        class: NodeClass::Math,
        applies: |f| f.mathml && f.local_name == Some(vocab::MATH),
    },
    Matcher {
        class: NodeClass::Image,
        applies: |f| f.is_element() && f.subtype == Some(subtype::IMAGE),
    },
    Matcher {
        class: NodeClass::PageIndicator,
        applies: |f| f.is_element() && f.subtype == Some(subtype::PAGE_NUM),
    },
    Matcher {
        class: NodeClass::BoxContainer,
        applies: |f| f.is_element() && f.subtype == Some(subtype::BOX),
    },
    Matcher {
        class: NodeClass::Text,
        applies: |f| f.kind == NodeKind::Text,
    },
];

/// Resolve a node's class; anything no rule claims is a plain container
pub fn classify(facts: &NodeFacts<'_>) -> NodeClass {
    MATCHERS
        .iter()
        .find(|m| (m.applies)(facts))
        .map(|m| m.class)
        .unwrap_or(NodeClass::Container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn class_of(xml: &str) -> NodeClass {
        let doc = Document::parse(xml).unwrap();
        let root = doc.root_element_id().unwrap();
        let target = doc.children(root).last().unwrap();
        classify(&NodeFacts::extract(&doc, target).unwrap())
    }

    #[test]
    fn test_table_types() {
        assert_eq!(class_of(r#"<r><t subtype="table"/></r>"#), NodeClass::SimpleTable);
        assert_eq!(
            class_of(r#"<r><t subtype="table" tableType="simple"/></r>"#),
            NodeClass::SimpleTable
        );
        assert_eq!(
            class_of(r#"<r><t subtype="table" tableType="listed"/></r>"#),
            NodeClass::ReadOnlyContainer
        );
        assert_eq!(
            class_of(r#"<r><t type="container" subtype="matrix"/></r>"#),
            NodeClass::ReadOnlyContainer
        );
    }

    #[test]
    fn test_tab_collapse() {
        assert_eq!(class_of(r#"<r>a<s type="span" subtype="tab"/></r>"#), NodeClass::Tab);
        assert_eq!(
            class_of(r#"<r><s type="span" subtype="tab"/><s type="span" subtype="tab"/></r>"#),
            NodeClass::CollapsedTab
        );
    }

    #[test]
    fn test_braille_wins() {
        assert_eq!(
            class_of(r#"<r xmlns:utd="urn:dualview:braille"><utd:brl subtype="table"/></r>"#),
            NodeClass::Braille
        );
    }

    #[test]
    fn test_math_and_fallbacks() {
        assert_eq!(
            class_of(r#"<r><m:math xmlns:m="http://www.w3.org/1998/Math/MathML"/></r>"#),
            NodeClass::Math
        );
        // a math element outside MathML is an ordinary container
        assert_eq!(class_of("<r><math/></r>"), NodeClass::Container);
        assert_eq!(class_of("<r><p/>text</r>"), NodeClass::Text);
        assert_eq!(class_of(r#"<r><p type="block" subtype="pageNum"/></r>"#), NodeClass::PageIndicator);
        assert_eq!(class_of(r#"<r><p subtype="box"/></r>"#), NodeClass::BoxContainer);
        assert_eq!(class_of(r#"<r><i type="span" subtype="image"/></r>"#), NodeClass::Image);
    }
}
