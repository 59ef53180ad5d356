//! Translation engine seam
//!
//! Braille is produced outside the core. After an edit the session hands the
//! engine a [`ReformatRequest`] naming the smallest subtrees whose braille or
//! formatting could have changed; the engine refreshes the braille-namespace
//! siblings in place and the window is rebuilt from the tree. The call is
//! blocking.

use tracing::debug;

use crate::dom::{axes, Document, DocumentAccess, NodeId};
use crate::error::TranslationError;
use crate::vocab::{self, braille, BRAILLE_NS, BRAILLE_PREFIX};

/// Subtrees to reformat
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReformatRequest {
    pub nodes: Vec<NodeId>,
    /// Regenerate braille, not just layout
    pub retranslate: bool,
}

impl ReformatRequest {
    pub fn new(nodes: Vec<NodeId>, retranslate: bool) -> Self {
        ReformatRequest { nodes, retranslate }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub trait TranslationEngine {
    fn reformat(&mut self, doc: &mut Document, request: &ReformatRequest) -> Result<(), TranslationError>;
}

/// Leaves the tree untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEngine;

impl TranslationEngine for NullEngine {
    fn reformat(&mut self, _doc: &mut Document, _request: &ReformatRequest) -> Result<(), TranslationError> {
        Ok(())
    }
}

/// Writes each text node's uppercased text into a `brl` sibling. Stands in
/// for a real engine in previews and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoEngine;

impl EchoEngine {
    fn ensure_prefix(doc: &mut Document) -> Result<(), TranslationError> {
        let Some(root) = doc.root_element_id() else {
            return Err(TranslationError::new("document has no root element"));
        };
        let decl = format!("xmlns:{BRAILLE_PREFIX}");
        if doc.get_attribute(root, &decl).is_none() {
            doc.set_attribute(root, &decl, BRAILLE_NS)
                .map_err(|e| TranslationError::new(e.to_string()))?;
        }
        Ok(())
    }

    /// Print text nodes at or beneath `node`, braille subtrees excluded
    fn text_nodes(doc: &Document, node: NodeId) -> Vec<NodeId> {
        if doc.is_text(node) {
            let in_braille = axes::find_ancestor(doc, node, |d, id| vocab::is_braille(d, id)).is_some();
            return if in_braille { Vec::new() } else { vec![node] };
        }
        if vocab::is_braille(doc, node) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = doc.children_vec(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            if doc.is_text(current) {
                out.push(current);
            } else if !vocab::is_braille(doc, current) {
                stack.extend(doc.children_vec(current).into_iter().rev());
            }
        }
        out
    }

    fn translate_text(doc: &mut Document, text: NodeId) -> Result<(), TranslationError> {
        let fail = |e: crate::error::DomError| TranslationError::new(e.to_string());
        if let Some(next) = doc.next_sibling_of(text) {
            if vocab::is_brl(doc, next) {
                doc.detach(next).map_err(fail)?;
            }
        }
        let content = doc.text_content(text).unwrap_or_default().to_uppercase();
        let brl = doc.create_element(&format!("{BRAILLE_PREFIX}:{}", braille::BRL), Some(BRAILLE_NS));
        let cell = doc.create_text(content);
        doc.append_child(brl, cell).map_err(fail)?;
        doc.insert_after(text, brl).map_err(fail)
    }
}

impl TranslationEngine for EchoEngine {
    fn reformat(&mut self, doc: &mut Document, request: &ReformatRequest) -> Result<(), TranslationError> {
        if !request.retranslate {
            return Ok(());
        }
        Self::ensure_prefix(doc)?;
        let mut translated = 0usize;
        for &node in &request.nodes {
            if !doc.is_attached(node) {
                continue;
            }
            for text in Self::text_nodes(doc, node) {
                Self::translate_text(doc, text)?;
                translated += 1;
            }
        }
        debug!(nodes = request.nodes.len(), translated, "echo engine reformat");
        Ok(())
    }
}
