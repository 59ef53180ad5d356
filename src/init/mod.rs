//! Initializer - one-shot tree to section list builder
//!
//! Walks the tree depth-first (see [`axes::walk`]) classifying every node
//! with the matcher table in [`classify`], emitting typed mapped elements
//! in document order and attaching each generated braille sibling to the
//! element before it. Output is cut into sections of roughly
//! `section_threshold` print chars, only ever at a block boundary.
//!
//! The build only reads the tree.

pub mod classify;

use tracing::debug;

use crate::config::ViewConfig;
use crate::dom::axes::{self, Visitor, Walk};
use crate::dom::{DocumentAccess, NodeId, NodeKind};
use crate::error::NodeContextError;
use crate::map::{BrailleKind, BrailleMappedElement, ElementKind, MappedElement, Section};
use crate::vocab::{self, braille};

pub use classify::{classify, NodeClass, NodeFacts};

#[derive(Debug, Clone)]
pub struct Initializer {
    section_threshold: usize,
}

impl Initializer {
    pub fn new(config: &ViewConfig) -> Self {
        Initializer {
            section_threshold: config.section_threshold,
        }
    }

    /// Build the section list for the subtree at `root`. Always returns at
    /// least one (possibly empty) section.
    pub fn build<D: DocumentAccess>(&self, doc: &D, root: NodeId) -> Result<Vec<Section>, NodeContextError> {
        let mut builder = Builder {
            threshold: self.section_threshold,
            sections: Vec::new(),
            current: Section::new(),
            last_block: None,
            read_only: Vec::new(),
            boxes: Vec::new(),
        };
        axes::walk(doc, root, &mut builder)?;
        let sections = builder.finish();
        debug!(
            sections = sections.len(),
            elements = sections.iter().map(Section::len).sum::<usize>(),
            chars = sections.iter().map(|s| s.chars).sum::<usize>(),
            "initializer partitioned document"
        );
        Ok(sections)
    }
}

/// An open box container and the `brl` deferred to its closing line
struct OpenBox {
    node: NodeId,
    closing_braille: Option<NodeId>,
}

struct Builder {
    threshold: usize,
    sections: Vec<Section>,
    current: Section,
    /// Block of the last emitted element; `None` before the first
    last_block: Option<Option<NodeId>>,
    /// Read-only containers currently open
    read_only: Vec<NodeId>,
    boxes: Vec<OpenBox>,
}

impl Builder {
    fn finish(mut self) -> Vec<Section> {
        if !self.current.is_empty() || self.sections.is_empty() {
            self.sections.push(self.current);
        }
        self.sections
    }

    fn emit<D: DocumentAccess>(&mut self, doc: &D, mut element: MappedElement) {
        if self.current.chars > self.threshold
            && !self.current.is_empty()
            && self.last_block != Some(element.block)
        {
            let full = std::mem::take(&mut self.current);
            self.sections.push(full);
        }
        if !self.read_only.is_empty() {
            element.read_only = true;
            if element.kind == ElementKind::Text {
                element.kind = ElementKind::ReadOnlyText;
            }
        }
        element.section = self.sections.len();
        self.last_block = Some(element.block);
        let len = element.print_len(doc);
        self.current.push(element, len);
    }

    fn last_element(&mut self) -> Option<&mut MappedElement> {
        if self.current.is_empty() {
            self.sections.last_mut().and_then(|s| s.elements.last_mut())
        } else {
            self.current.elements.last_mut()
        }
    }

    fn attach_braille<D: DocumentAccess>(&mut self, doc: &D, brl: NodeId) -> Result<(), NodeContextError> {
        let fragments = braille_fragments(doc, brl);
        match self.last_element() {
            Some(owner) => {
                owner.braille.extend(fragments);
                Ok(())
            }
            None => Err(NodeContextError::new(
                doc,
                brl,
                "braille content has no preceding element to attach to",
            )),
        }
    }

    fn braille<D: DocumentAccess>(&mut self, doc: &D, node: NodeId) -> Result<Walk, NodeContextError> {
        if !vocab::is_brl(doc, node) {
            // moveTo and friends carry no view content
            return Ok(Walk::SkipChildren);
        }
        let closes_box = doc.next_sibling_of(node).is_none()
            && self
                .boxes
                .last()
                .is_some_and(|open| doc.parent_of(node) == Some(open.node));
        if closes_box {
            if let Some(open) = self.boxes.last_mut() {
                open.closing_braille = Some(node);
            }
        } else {
            self.attach_braille(doc, node)?;
        }
        Ok(Walk::SkipChildren)
    }

    /// Emit a self-contained element whose braille is every fragment below it
    fn emit_whole<D: DocumentAccess>(&mut self, doc: &D, node: NodeId, kind: ElementKind, block: Option<NodeId>) {
        let mut element = MappedElement::new(kind, Some(node), block);
        element.braille = nested_braille(doc, node);
        self.emit(doc, element);
    }
}

impl<D: DocumentAccess> Visitor<D> for Builder {
    type Error = NodeContextError;

    fn enter(&mut self, doc: &D, node: NodeId) -> Result<Walk, NodeContextError> {
        let Some(facts) = NodeFacts::extract(doc, node) else {
            return Ok(Walk::SkipChildren);
        };
        if facts.kind == NodeKind::Document {
            return Ok(Walk::Continue);
        }
        let class = classify(&facts);
        match class {
            NodeClass::Braille => self.braille(doc, node),
            NodeClass::ReadOnlyContainer => {
                self.read_only.push(node);
                Ok(Walk::Continue)
            }
            NodeClass::SimpleTable => {
                let rows = doc
                    .children_vec(node)
                    .into_iter()
                    .filter(|&row| doc.is_element(row) && !vocab::is_braille(doc, row))
                    .map(|row| {
                        doc.children_vec(row)
                            .into_iter()
                            .filter(|&cell| doc.is_element(cell) && !vocab::is_braille(doc, cell))
                            .collect()
                    })
                    .collect();
                self.emit_whole(doc, node, ElementKind::Table { rows }, Some(node));
                Ok(Walk::SkipChildren)
            }
            NodeClass::CollapsedTab => Ok(Walk::SkipChildren),
            NodeClass::Tab => {
                let element = MappedElement::new(ElementKind::Tab, Some(node), block_of(doc, node));
                self.emit(doc, element);
                Ok(Walk::SkipChildren)
            }
            NodeClass::Math => {
                self.emit_whole(doc, node, ElementKind::Math, block_of(doc, node));
                Ok(Walk::SkipChildren)
            }
            NodeClass::Image => {
                let element = MappedElement::new(ElementKind::Image, Some(node), block_of(doc, node));
                self.emit(doc, element);
                Ok(Walk::SkipChildren)
            }
            NodeClass::PageIndicator => {
                self.emit_whole(doc, node, ElementKind::PageIndicator, Some(node));
                Ok(Walk::SkipChildren)
            }
            NodeClass::BoxContainer => {
                let kind = ElementKind::BoxLine {
                    container: node,
                    end: false,
                };
                self.emit(doc, MappedElement::new(kind, Some(node), Some(node)));
                self.boxes.push(OpenBox {
                    node,
                    closing_braille: None,
                });
                Ok(Walk::Continue)
            }
            NodeClass::Text => {
                self.emit(doc, MappedElement::text(node, block_of(doc, node)));
                Ok(Walk::SkipChildren)
            }
            NodeClass::Container => Ok(Walk::Continue),
        }
    }

    fn leave(&mut self, doc: &D, node: NodeId) -> Result<(), NodeContextError> {
        if self.read_only.last() == Some(&node) {
            self.read_only.pop();
        }
        if self.boxes.last().is_some_and(|open| open.node == node) {
            if let Some(open) = self.boxes.pop() {
                let kind = ElementKind::BoxLine {
                    container: node,
                    end: true,
                };
                self.emit(doc, MappedElement::new(kind, None, Some(node)));
                if let Some(brl) = open.closing_braille {
                    self.attach_braille(doc, brl)?;
                }
            }
        }
        Ok(())
    }
}

/// Layout block of a node: the nearest `block`-typed ancestor-or-self,
/// falling back to the parent element for untyped documents
pub fn block_of<D: DocumentAccess>(doc: &D, node: NodeId) -> Option<NodeId> {
    axes::find_ancestor_or_self(doc, node, |d, id| vocab::is_block(d, id)).or_else(|| {
        let parent = doc.parent_of(node)?;
        doc.is_element(parent).then_some(parent)
    })
}

/// Braille fragments of one `brl` element in document order
pub fn braille_fragments<D: DocumentAccess>(doc: &D, brl: NodeId) -> Vec<BrailleMappedElement> {
    doc.children_vec(brl)
        .into_iter()
        .filter_map(|child| {
            if doc.is_text(child) {
                return Some(BrailleMappedElement::new(child, BrailleKind::Text));
            }
            if !vocab::is_braille(doc, child) {
                return None;
            }
            let kind = match doc.node_local_name(child)? {
                braille::PAGE_NUM => BrailleKind::PageNumber,
                braille::GUIDE_WORD => BrailleKind::GuideWord,
                braille::UNCONTRACTED => BrailleKind::Uncontracted,
                braille::PRONUNCIATION => BrailleKind::Pronunciation,
                braille::NEW_PAGE => BrailleKind::PageBreak,
                _ => return None,
            };
            Some(BrailleMappedElement::new(child, kind))
        })
        .collect()
}

/// Fragments of every `brl` element beneath `node`
pub fn nested_braille<D: DocumentAccess>(doc: &D, node: NodeId) -> Vec<BrailleMappedElement> {
    axes::descendants(doc, node)
        .into_iter()
        .filter(|&id| vocab::is_brl(doc, id))
        .flat_map(|brl| braille_fragments(doc, brl))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use tracing_test::traced_test;

    const NS: &str = r#"xmlns:utd="urn:dualview:braille" xmlns:m="http://www.w3.org/1998/Math/MathML""#;

    fn build(xml: &str, threshold: usize) -> (Document, Vec<Section>) {
        let doc = Document::parse(xml).unwrap();
        let config = ViewConfig::default().with_section_threshold(threshold);
        let root = doc.root_element_id().unwrap();
        let sections = Initializer::new(&config).build(&doc, root).unwrap();
        (doc, sections)
    }

    fn kinds(sections: &[Section]) -> Vec<&'static str> {
        sections
            .iter()
            .flat_map(|s| s.elements.iter())
            .map(|e| e.kind.name())
            .collect()
    }

    #[test]
    fn test_single_text() {
        let (doc, sections) = build(r#"<book><p type="block">Hello World</p></book>"#, 100);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].chars, 11);
        let element = &sections[0].elements[0];
        assert_eq!(element.print_text(&doc), "Hello World");
        assert!(element.braille.is_empty());
    }

    #[test]
    fn test_braille_attaches_to_preceding() {
        let xml = format!(
            r#"<book {NS}><p type="block">a<utd:brl>A<utd:brlPageNum>#B</utd:brlPageNum><utd:moveTo/></utd:brl>b</p></book>"#
        );
        let (doc, sections) = build(&xml, 100);
        let elements = &sections[0].elements;
        assert_eq!(elements.len(), 2);
        let kinds: Vec<_> = elements[0].braille.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BrailleKind::Text, BrailleKind::PageNumber]);
        assert_eq!(elements[0].braille_text(&doc), "A#B");
        assert!(elements[1].braille.is_empty());
    }

    #[test]
    fn test_orphan_braille_fails() {
        let xml = format!(r#"<book {NS}><utd:brl>A</utd:brl><p>a</p></book>"#);
        let doc = Document::parse(&xml).unwrap();
        let root = doc.root_element_id().unwrap();
        let err = Initializer::new(&ViewConfig::default()).build(&doc, root).unwrap_err();
        assert_eq!(doc.node_local_name(err.node), Some("brl"));
        assert_eq!(err.path, "/book[1]/utd:brl[1]");
    }

    #[test]
    fn test_read_only_subtree() {
        let xml = r#"<book><g type="container" subtype="spatialGrid"><p>1</p></g><p>2</p></book>"#;
        let (_, sections) = build(xml, 100);
        let elements = &sections[0].elements;
        assert_eq!(elements[0].kind, ElementKind::ReadOnlyText);
        assert!(elements[0].read_only);
        assert_eq!(elements[1].kind, ElementKind::Text);
        assert!(!elements[1].read_only);
    }

    #[test]
    fn test_table_math_tabs() {
        let xml = format!(
            r#"<book {NS}><t subtype="table"><tr><td>a<utd:brl>A</utd:brl></td><td>b</td></tr></t><p type="block">x<s type="span" subtype="tab" tabValue="6"/><s type="span" subtype="tab"/><m:math><m:mi>y</m:mi><utd:brl>Y</utd:brl></m:math></p></book>"#
        );
        let (doc, sections) = build(&xml, 100);
        assert_eq!(kinds(&sections), vec!["table", "text", "tab", "math"]);
        let elements = &sections[0].elements;
        assert_eq!(elements[0].print_text(&doc), "a  b");
        assert_eq!(elements[0].braille_text(&doc), "A");
        assert_eq!(elements[3].print_text(&doc), "y");
        assert_eq!(elements[3].braille_text(&doc), "Y");
    }

    #[test]
    fn test_box_lines() {
        let xml = format!(
            r#"<book {NS}><b type="container" subtype="box"><p type="block">in<utd:brl>IN</utd:brl></p><utd:brl>===</utd:brl></b></book>"#
        );
        let (doc, sections) = build(&xml, 100);
        assert_eq!(kinds(&sections), vec!["box line", "text", "box line"]);
        let elements = &sections[0].elements;
        assert_eq!(elements[1].braille_text(&doc), "IN");
        assert_eq!(elements[2].braille_text(&doc), "===");
        assert_eq!(elements[2].node, None);
        assert_eq!(elements[2].anchor_node(), elements[0].node);
    }

    #[test]
    fn test_sections_break_at_block_boundary() {
        let xml = r#"<book><p type="block">aaaa<i>bbbb</i></p><p type="block">cccc</p><p type="block">dd</p></book>"#;
        let (_, sections) = build(xml, 3);
        // the first block is never split even though it crosses the threshold
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].len(), 2);
        assert_eq!(sections[0].chars, 8);
        assert_eq!(sections[1].elements[0].section, 1);
        assert_eq!(sections[2].chars, 2);
    }

    #[test]
    fn test_page_indicators_counted() {
        let xml = r#"<book><p type="block" subtype="pageNum">12</p><p type="block">x</p></book>"#;
        let (_, sections) = build(xml, 100);
        assert_eq!(sections[0].pages, 1);
        assert_eq!(kinds(&sections), vec!["page indicator", "text"]);
    }

    #[test]
    fn test_empty_document_has_one_section() {
        let (_, sections) = build("<book/>", 100);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].is_empty());
    }

    #[traced_test]
    #[test]
    fn test_partition_logged() {
        build(r#"<book><p>x</p></book>"#, 100);
        assert!(logs_contain("initializer partitioned document"));
    }
}
