//! XML Serialization
//!
//! Writes a subtree back to markup. Persistence belongs to an outside
//! archiver; this is used to hand the tree over and to inspect it in tests.

use super::document::Document;
use super::node::{NodeId, NodeKind, DOCUMENT_NODE};
use super::DocumentAccess;

impl Document {
    /// Serialize the whole document (root element and below)
    pub fn to_xml(&self) -> String {
        self.subtree_to_xml(DOCUMENT_NODE)
    }

    /// Serialize one node and its descendants
    pub fn subtree_to_xml(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get_node(id) else {
            return;
        };
        match node.kind {
            NodeKind::Document => {
                for child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeKind::Text => escape_into(&node.text, false, out),
            NodeKind::Element => {
                let name = self.node_name(id).unwrap_or_default();
                out.push('<');
                out.push_str(name);
                for (attr, value) in self.get_attribute_values(id) {
                    out.push(' ');
                    out.push_str(attr);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                if !node.has_children() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
