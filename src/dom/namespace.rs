//! Namespace scopes for the loader
//!
//! Each open element gets one frame holding the `xmlns` declarations it
//! carries. Lookups walk the frames innermost first, so a declaration is
//! visible to its element and everything below it until the element closes.
//! Braille (`utd:`) and MathML content depend on this to be classified.

use super::strings::StringPool;

/// Namespace URIs every document has without declaring them
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

const DEFAULT_DECL: &str = "xmlns";
const PREFIX_DECL: &str = "xmlns:";

#[derive(Debug, Default)]
struct Frame {
    /// `Some(None)` when the element undeclares the default namespace
    default: Option<Option<u32>>,
    /// (prefix id, uri id)
    prefixed: Vec<(u32, u32)>,
}

#[derive(Debug)]
pub struct NamespaceScopes {
    frames: Vec<Frame>,
    xml_prefix: u32,
    xml_uri: u32,
}

impl NamespaceScopes {
    pub fn new(strings: &mut StringPool) -> Self {
        NamespaceScopes {
            frames: Vec::new(),
            xml_prefix: strings.intern("xml"),
            xml_uri: strings.intern(ns::XML),
        }
    }

    /// Open a frame for an element with these attributes, recording its
    /// namespace declarations
    pub fn open(&mut self, attributes: &[(&str, &str)], strings: &mut StringPool) {
        let mut frame = Frame::default();
        for &(name, value) in attributes {
            if name == DEFAULT_DECL {
                frame.default = Some((!value.is_empty()).then(|| strings.intern(value)));
            } else if let Some(prefix) = name.strip_prefix(PREFIX_DECL) {
                // `xml` is fixed and `xmlns` is never a real prefix
                if prefix == "xml" || prefix == DEFAULT_DECL || value.is_empty() {
                    continue;
                }
                frame.prefixed.push((strings.intern(prefix), strings.intern(value)));
            }
        }
        self.frames.push(frame);
    }

    /// Drop the innermost frame
    pub fn close(&mut self) {
        self.frames.pop();
    }

    fn prefix_uri(&self, prefix: u32) -> Option<u32> {
        if prefix == self.xml_prefix {
            return Some(self.xml_uri);
        }
        self.frames.iter().rev().find_map(|frame| {
            frame
                .prefixed
                .iter()
                .rev()
                .find(|&&(p, _)| p == prefix)
                .map(|&(_, uri)| uri)
        })
    }

    fn default_uri(&self) -> Option<u32> {
        self.frames.iter().rev().find_map(|frame| frame.default).flatten()
    }

    /// Namespace URI id of an element's qualified name in the current scope.
    /// An unknown prefix leaves the element without a namespace.
    pub fn element_uri(&self, qname: &str, strings: &StringPool) -> Option<u32> {
        match qname.split_once(':') {
            Some((prefix, _)) => strings.lookup(prefix).and_then(|id| self.prefix_uri(id)),
            None => self.default_uri(),
        }
    }

    /// Open element frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{BRAILLE_NS, MATHML_NS};

    fn uri<'a>(scopes: &NamespaceScopes, strings: &'a StringPool, qname: &str) -> Option<&'a str> {
        scopes
            .element_uri(qname, strings)
            .and_then(|id| strings.get_str(id))
    }

    #[test]
    fn test_xml_prefix_is_predeclared() {
        let mut strings = StringPool::new();
        let scopes = NamespaceScopes::new(&mut strings);
        assert_eq!(uri(&scopes, &strings, "xml:lang"), Some(ns::XML));
    }

    #[test]
    fn test_braille_prefix_scoped_to_element() {
        let mut strings = StringPool::new();
        let mut scopes = NamespaceScopes::new(&mut strings);
        scopes.open(&[("xmlns:utd", BRAILLE_NS)], &mut strings);
        scopes.open(&[], &mut strings);
        assert_eq!(uri(&scopes, &strings, "utd:brl"), Some(BRAILLE_NS));
        scopes.close();
        scopes.close();
        assert_eq!(uri(&scopes, &strings, "utd:brl"), None);
        assert_eq!(scopes.depth(), 0);
    }

    #[test]
    fn test_default_namespace_and_undeclare() {
        let mut strings = StringPool::new();
        let mut scopes = NamespaceScopes::new(&mut strings);
        scopes.open(&[("xmlns", MATHML_NS)], &mut strings);
        assert_eq!(uri(&scopes, &strings, "mi"), Some(MATHML_NS));
        scopes.open(&[("xmlns", "")], &mut strings);
        assert_eq!(uri(&scopes, &strings, "p"), None);
        scopes.close();
        assert_eq!(uri(&scopes, &strings, "mn"), Some(MATHML_NS));
    }

    #[test]
    fn test_inner_declaration_shadows() {
        let mut strings = StringPool::new();
        let mut scopes = NamespaceScopes::new(&mut strings);
        scopes.open(&[("xmlns:m", "urn:one")], &mut strings);
        scopes.open(&[("xmlns:m", MATHML_NS)], &mut strings);
        assert_eq!(uri(&scopes, &strings, "m:math"), Some(MATHML_NS));
        scopes.close();
        assert_eq!(uri(&scopes, &strings, "m:math"), Some("urn:one"));
    }

    #[test]
    fn test_xml_prefix_cannot_be_rebound() {
        let mut strings = StringPool::new();
        let mut scopes = NamespaceScopes::new(&mut strings);
        scopes.open(&[("xmlns:xml", "urn:other")], &mut strings);
        assert_eq!(uri(&scopes, &strings, "xml:space"), Some(ns::XML));
    }
}
