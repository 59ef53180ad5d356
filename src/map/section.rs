//! Sections - bounded partitions of the mapped-element sequence

use super::element::{ElementKind, MappedElement};
use crate::dom::{DocumentAccess, NodeId};

/// A contiguous run of mapped elements. While the section is in view its
/// elements live in the MapList and `elements` is empty; `chars` and `pages`
/// keep describing the section either way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub elements: Vec<MappedElement>,
    /// Print chars of the content elements
    pub chars: usize,
    /// Print page indicators in the section
    pub pages: usize,
    pub in_view: bool,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append an element, adding its already-measured print length
    pub fn push(&mut self, element: MappedElement, print_len: usize) {
        if element.kind == ElementKind::PageIndicator {
            self.pages += 1;
        }
        self.chars += print_len;
        self.elements.push(element);
    }

    /// Recompute `chars` and `pages` from the tree
    pub fn recount<D: DocumentAccess>(&mut self, doc: &D) {
        self.chars = self.elements.iter().map(|e| e.print_len(doc)).sum();
        self.pages = self
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::PageIndicator)
            .count();
    }

    /// Index of the element backed by `node`
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.elements.iter().position(|e| e.node == Some(node))
    }

    /// Take the elements out for loading into the live list
    pub fn take_elements(&mut self) -> Vec<MappedElement> {
        std::mem::take(&mut self.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_push_and_recount() {
        let doc = Document::parse("<r><p>Hello</p><p>World!</p></r>").unwrap();
        let root = doc.root_element_id().unwrap();
        let texts: Vec<NodeId> = doc.descendants(root).filter(|&n| doc.is_text(n)).collect();
        let mut section = Section::new();
        section.push(MappedElement::text(texts[0], None), 5);
        section.push(MappedElement::new(ElementKind::PageIndicator, Some(texts[1]), None), 0);
        assert_eq!(section.chars, 5);
        assert_eq!(section.pages, 1);
        section.elements.pop();
        section.recount(&doc);
        assert_eq!(section.pages, 0);
        assert_eq!(section.index_of(texts[0]), Some(0));
        assert_eq!(section.index_of(texts[1]), None);
    }
}
