//! Offset-addressable text buffers
//!
//! The widgets that render the print and braille views belong to the
//! embedding application; the core only needs the operations in
//! [`ViewBuffer`]. [`TextBuffer`] is the in-memory implementation.

use memchr::memchr_iter;

use crate::dom::{byte_index, char_len};

/// One rendered view. All offsets are in chars.
pub trait ViewBuffer {
    fn char_count(&self) -> usize;

    /// Zero-based line containing `offset`
    fn line_at_offset(&self, offset: usize) -> usize;

    fn caret_offset(&self) -> usize;

    fn set_caret_offset(&mut self, offset: usize);

    /// Replace `len` chars starting at `start` with `text`
    fn replace_text_range(&mut self, start: usize, len: usize, text: &str);

    fn text(&self) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    chars: usize,
    caret: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl ViewBuffer for TextBuffer {
    fn char_count(&self) -> usize {
        self.chars
    }

    fn line_at_offset(&self, offset: usize) -> usize {
        let end = byte_index(&self.text, offset);
        memchr_iter(b'\n', &self.text.as_bytes()[..end]).count()
    }

    fn caret_offset(&self) -> usize {
        self.caret
    }

    fn set_caret_offset(&mut self, offset: usize) {
        self.caret = offset.min(self.chars);
    }

    fn replace_text_range(&mut self, start: usize, len: usize, text: &str) {
        let from = byte_index(&self.text, start);
        let to = byte_index(&self.text, start.saturating_add(len));
        self.text.replace_range(from..to, text);
        self.chars = char_len(&self.text);
        self.caret = self.caret.min(self.chars);
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

/// The print and braille buffers of one document
pub struct DualView {
    pub print: Box<dyn ViewBuffer + Send>,
    pub braille: Box<dyn ViewBuffer + Send>,
}

impl DualView {
    pub fn new(print: Box<dyn ViewBuffer + Send>, braille: Box<dyn ViewBuffer + Send>) -> Self {
        DualView { print, braille }
    }

    /// Two empty [`TextBuffer`]s
    pub fn in_memory() -> Self {
        Self::new(Box::new(TextBuffer::new()), Box::new(TextBuffer::new()))
    }

    /// Overwrite both buffers in full
    pub fn rewrite(&mut self, print: &str, braille: &str) {
        let len = self.print.char_count();
        self.print.replace_text_range(0, len, print);
        let len = self.braille.char_count();
        self.braille.replace_text_range(0, len, braille);
    }
}

impl Default for DualView {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for DualView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualView")
            .field("print_chars", &self.print.char_count())
            .field("braille_chars", &self.braille.char_count())
            .finish()
    }
}
