//! Document Loader
//!
//! Builds a [`Document`] from XML text in a single pass. Delimiters are found
//! with memchr (SIMD where available); namespaces are resolved with a scope
//! stack as elements open and close.
//!
//! The loader keeps every significant text run, folds CDATA into text, and
//! drops comments, processing instructions and the DOCTYPE. Whitespace-only
//! runs that contain a line break are pretty-print indentation and are
//! dropped too.

use std::borrow::Cow;

use memchr::{memchr, memchr2, memmem};

use super::document::Document;
use super::namespace::NamespaceScopes;
use super::node::{NodeId, DOCUMENT_NODE};
use crate::error::LoadError;

impl Document {
    /// Parse XML text into a new document
    pub fn parse(input: &str) -> Result<Self, LoadError> {
        Loader::new(input).run()
    }
}

struct Loader<'a> {
    input: &'a str,
    pos: usize,
    doc: Document,
    /// Open elements and their qualified names
    stack: Vec<(NodeId, &'a str)>,
    scopes: NamespaceScopes,
}

impl<'a> Loader<'a> {
    fn new(input: &'a str) -> Self {
        let mut doc = Document::new();
        let scopes = NamespaceScopes::new(&mut doc.strings);
        Loader {
            input,
            pos: 0,
            doc,
            stack: Vec::with_capacity(32),
            scopes,
        }
    }

    #[inline]
    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    #[inline]
    fn parent(&self) -> NodeId {
        self.stack.last().map(|&(id, _)| id).unwrap_or(DOCUMENT_NODE)
    }

    fn run(mut self) -> Result<Document, LoadError> {
        while self.pos < self.input.len() {
            match memchr(b'<', &self.bytes()[self.pos..]) {
                Some(offset) => {
                    let lt = self.pos + offset;
                    self.text(self.pos, lt)?;
                    self.pos = lt;
                    self.markup()?;
                }
                None => {
                    self.text(self.pos, self.input.len())?;
                    self.pos = self.input.len();
                }
            }
        }

        if let Some(&(_, name)) = self.stack.last() {
            return Err(LoadError::Unclosed(name.to_string()));
        }
        if self.doc.root_element_id().is_none() {
            return Err(LoadError::NoRoot);
        }
        Ok(self.doc)
    }

    fn text(&mut self, start: usize, end: usize) -> Result<(), LoadError> {
        if start >= end {
            return Ok(());
        }
        let raw = &self.input[start..end];
        let blank = raw.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
        if self.stack.is_empty() {
            if blank {
                return Ok(());
            }
            return Err(LoadError::Malformed {
                position: start,
                message: "text outside the root element",
            });
        }
        if blank && memchr2(b'\n', b'\r', raw.as_bytes()).is_some() {
            return Ok(());
        }
        let decoded = decode_text(raw).into_owned();
        self.push_text(decoded);
        Ok(())
    }

    fn push_text(&mut self, text: String) {
        let parent = self.parent();
        let id = self.doc.create_text(text);
        // parent is an open element, which is always a valid container
        let _ = self.doc.append_child(parent, id);
    }

    fn find_from(&self, from: usize, needle: &[u8]) -> Result<usize, LoadError> {
        memmem::find(&self.bytes()[from..], needle)
            .map(|i| from + i)
            .ok_or(LoadError::UnexpectedEof(self.input.len()))
    }

    fn markup(&mut self) -> Result<(), LoadError> {
        let input = self.input;
        let rest = &input[self.pos..];
        if rest.starts_with("<!--") {
            let end = self.find_from(self.pos + 4, b"-->")?;
            self.pos = end + 3;
        } else if rest.starts_with("<![CDATA[") {
            let start = self.pos + 9;
            let end = self.find_from(start, b"]]>")?;
            if self.stack.is_empty() {
                return Err(LoadError::Malformed {
                    position: self.pos,
                    message: "CDATA outside the root element",
                });
            }
            let content = input[start..end].to_string();
            if !content.is_empty() {
                self.push_text(content);
            }
            self.pos = end + 3;
        } else if rest.starts_with("<?") {
            let end = self.find_from(self.pos + 2, b"?>")?;
            self.pos = end + 2;
        } else if rest.starts_with("<!") {
            self.pos = self.doctype_end()?;
        } else if rest.starts_with("</") {
            self.end_tag()?;
        } else {
            self.start_tag()?;
        }
        Ok(())
    }

    /// DOCTYPE may carry an internal subset in brackets
    fn doctype_end(&self) -> Result<usize, LoadError> {
        let gt = self.find_from(self.pos, b">")?;
        match memchr(b'[', &self.bytes()[self.pos..gt]) {
            Some(_) => Ok(self.find_from(self.pos, b"]>")? + 2),
            None => Ok(gt + 1),
        }
    }

    fn end_tag(&mut self) -> Result<(), LoadError> {
        let input = self.input;
        let start = self.pos + 2;
        let gt = self.find_from(start, b">")?;
        let name = input[start..gt].trim_end();
        match self.stack.pop() {
            Some((_, open)) if open == name => {
                self.scopes.close();
                self.pos = gt + 1;
                Ok(())
            }
            Some((_, open)) => Err(LoadError::MismatchedTag {
                expected: open.to_string(),
                found: name.to_string(),
                position: self.pos,
            }),
            None => Err(LoadError::UnmatchedEnd {
                name: name.to_string(),
                position: self.pos,
            }),
        }
    }

    fn start_tag(&mut self) -> Result<(), LoadError> {
        let input = self.input;
        let tag_start = self.pos;
        let gt = find_tag_end_quoted(input.as_bytes(), tag_start + 1)
            .ok_or(LoadError::UnexpectedEof(input.len()))?;
        let mut body = &input[tag_start + 1..gt];
        let empty = body.ends_with('/');
        if empty {
            body = &body[..body.len() - 1];
        }

        let name_end = body
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(body.len());
        let name = &body[..name_end];
        if name.is_empty() {
            return Err(LoadError::Malformed {
                position: tag_start,
                message: "missing element name",
            });
        }
        if self.stack.is_empty() && self.doc.root_element_id().is_some() {
            return Err(LoadError::Malformed {
                position: tag_start,
                message: "content after the root element",
            });
        }
        let attributes = parse_attributes(&body[name_end..], tag_start + 1 + name_end)?;

        let declared: Vec<(&str, &str)> = attributes.iter().map(|(n, v)| (*n, v.as_str())).collect();
        self.scopes.open(&declared, &mut self.doc.strings);
        let namespace = self
            .scopes
            .element_uri(name, &self.doc.strings)
            .and_then(|id| self.doc.strings.get_str(id))
            .map(str::to_string);

        let id = self.doc.create_element(name, namespace.as_deref());
        for (attr_name, value) in attributes {
            // id is a fresh element
            let _ = self.doc.set_attribute(id, attr_name, value);
        }
        let parent = self.parent();
        let _ = self.doc.append_child(parent, id);

        if empty {
            self.scopes.close();
        } else {
            self.stack.push((id, name));
        }
        self.pos = gt + 1;
        Ok(())
    }
}

/// Find the '>' closing a tag, ignoring any inside quoted attribute values
fn find_tag_end_quoted(input: &[u8], from: usize) -> Option<usize> {
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    for (pos, &b) in input.iter().enumerate().skip(from) {
        match b {
            b'"' if !in_single_quote => in_double_quote = !in_double_quote,
            b'\'' if !in_double_quote => in_single_quote = !in_single_quote,
            b'>' if !in_single_quote && !in_double_quote => return Some(pos),
            _ => {}
        }
    }
    None
}

/// Parse `name="value"` pairs; `base` is the byte position for errors
fn parse_attributes(content: &str, base: usize) -> Result<Vec<(&str, String)>, LoadError> {
    let bytes = content.as_bytes();
    let mut attrs = Vec::new();
    let mut pos = 0;
    let malformed = |at: usize, message: &'static str| LoadError::Malformed {
        position: base + at,
        message,
    };

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        let name_start = pos;
        while pos < bytes.len() && bytes[pos] != b'=' && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let name = &content[name_start..pos];
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            return Err(malformed(pos, "attribute without value"));
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let quote = match bytes.get(pos) {
            Some(&q) if q == b'"' || q == b'\'' => q,
            _ => return Err(malformed(pos, "unquoted attribute value")),
        };
        let value_start = pos + 1;
        let value_len = memchr(quote, &bytes[value_start..])
            .ok_or_else(|| malformed(pos, "unterminated attribute value"))?;
        let value = decode_text(&content[value_start..value_start + value_len]).into_owned();
        attrs.push((name, value));
        pos = value_start + value_len + 1;
    }
    Ok(attrs)
}

/// Decode entity references; borrows when there are none
pub fn decode_text(input: &str) -> Cow<'_, str> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        result.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = memchr(b';', rest.as_bytes()).and_then(|semi| {
            decode_entity(&rest[1..semi]).map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                result.push(c);
                rest = &rest[consumed..];
            }
            None => {
                // Unknown entity, keep the ampersand literally
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);
    Cow::Owned(result)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}
