//! Whitespace layout pass
//!
//! Given the content elements of a window, rebuilds every synthetic
//! whitespace marker and the span cache from scratch:
//!
//! - a new block starts on a new line; between blocks `A` and `B` there are
//!   `1 + max(A.linesAfter, B.linesBefore)` line breaks, at document start
//!   `B.linesBefore`, at a window start past the first section none
//! - a new line is indented to its block's `indent`
//! - the gap after a tab runs to its `tabValue` column, or to the next
//!   default tab stop
//! - markers next to page indicators or box lines are `Painted`, markers
//!   next to read-only content are `ReadOnlyFormatting`
//! - text without braille borrows the braille span of the nearest earlier
//!   element in the same block that has some
//! - image placeholders span from the previous real element's end to the
//!   next one's start, less the line breaks in between
//!
//! Markers render identically in both views.

use memchr::memrchr;
use tracing::trace;

use crate::dom::{char_len, DocumentAccess, NodeId};
use crate::map::{ElementKind, ElementSpan, Filler, MappedElement, ViewRange, WhiteSpaceKind};
use crate::vocab::{self, BlockStyle};

/// A laid-out window, ready to install into the MapList and the views
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub elements: Vec<MappedElement>,
    pub spans: Vec<ElementSpan>,
    pub print: String,
    pub braille: String,
    pub print_len: usize,
    pub braille_len: usize,
}

impl Layout {
    fn push_marker(&mut self, kind: WhiteSpaceKind, filler: Filler, next: &MappedElement) {
        if filler.is_empty() {
            return;
        }
        let text = filler.text();
        let len = filler.len();
        self.spans.push(ElementSpan {
            print: ViewRange::new(self.print_len, self.print_len + len),
            braille: ViewRange::new(self.braille_len, self.braille_len + len),
            lender: None,
        });
        self.print.push_str(&text);
        self.braille.push_str(&text);
        self.print_len += len;
        self.braille_len += len;
        self.elements
            .push(MappedElement::white_space(kind, filler, next.block, next.section));
    }

    /// Nearest earlier element in `block` with its own braille
    fn lender(&self, block: Option<NodeId>) -> Option<usize> {
        for (i, element) in self.elements.iter().enumerate().rev() {
            if element.is_white_space() {
                continue;
            }
            if element.block != block {
                return None;
            }
            if !element.braille.is_empty() {
                return Some(i);
            }
        }
        None
    }

    fn count_markers(&self) -> usize {
        self.elements.iter().filter(|e| e.is_white_space()).count()
    }
}

fn marker_kind(natural: WhiteSpaceKind, prev: Option<&MappedElement>, next: &MappedElement) -> WhiteSpaceKind {
    let neighbours = || prev.into_iter().chain(std::iter::once(next));
    if neighbours().any(|e| matches!(e.kind, ElementKind::PageIndicator | ElementKind::BoxLine { .. })) {
        WhiteSpaceKind::Painted
    } else if neighbours().any(|e| e.read_only) {
        WhiteSpaceKind::ReadOnlyFormatting
    } else {
        natural
    }
}

fn tab_target<D: DocumentAccess>(doc: &D, tab: &MappedElement, column: usize, tab_width: usize) -> usize {
    tab.node
        .and_then(|node| vocab::attr_usize(doc, node, vocab::attr::TAB_VALUE))
        .unwrap_or((column / tab_width + 1) * tab_width)
}

/// Lay out `content` (any markers in it are discarded and rebuilt)
pub fn set_white_space<D: DocumentAccess>(
    doc: &D,
    content: Vec<MappedElement>,
    at_document_start: bool,
    tab_width: usize,
) -> Layout {
    let mut layout = Layout::default();
    let mut prev: Option<MappedElement> = None;
    let mut column = 0usize;
    let tab_width = tab_width.max(1);

    for element in content.into_iter().filter(|e| !e.is_white_space()) {
        let style = BlockStyle::of(doc, element.block);
        let breaks = match &prev {
            None => Some(if at_document_start { style.lines_before } else { 0 }),
            Some(p) if p.block != element.block => {
                let before = BlockStyle::of(doc, p.block);
                Some(1 + before.lines_after.max(style.lines_before))
            }
            Some(_) => None,
        };

        match breaks {
            Some(breaks) => {
                let kind = marker_kind(WhiteSpaceKind::LineBreak, prev.as_ref(), &element);
                for _ in 0..breaks {
                    layout.push_marker(kind, Filler::LineBreak, &element);
                }
                column = 0;
                if style.indent > 0 {
                    let kind = marker_kind(WhiteSpaceKind::Formatting, prev.as_ref(), &element);
                    layout.push_marker(kind, Filler::Spaces(style.indent), &element);
                    column = style.indent;
                }
            }
            None => {
                if let Some(tab) = prev.as_ref().filter(|p| p.kind == ElementKind::Tab) {
                    let width = tab_target(doc, tab, column, tab_width).saturating_sub(column);
                    let kind = marker_kind(WhiteSpaceKind::Horizontal, prev.as_ref(), &element);
                    layout.push_marker(kind, Filler::Spaces(width), &element);
                    column += width;
                }
            }
        }

        let print = element.print_text(doc);
        let print_len = char_len(&print);
        let print_range = ViewRange::new(layout.print_len, layout.print_len + print_len);
        layout.print.push_str(&print);
        layout.print_len += print_len;
        column = match memrchr(b'\n', print.as_bytes()) {
            Some(pos) => char_len(&print[pos + 1..]),
            None => column + print_len,
        };

        let borrows = matches!(element.kind, ElementKind::Text | ElementKind::ReadOnlyText)
            && element.braille.is_empty();
        let lender = if borrows { layout.lender(element.block) } else { None };
        let braille_range = match lender {
            Some(index) => layout.spans[index].braille,
            None => {
                let braille = element.braille_text(doc);
                let len = char_len(&braille);
                layout.braille.push_str(&braille);
                let range = ViewRange::new(layout.braille_len, layout.braille_len + len);
                layout.braille_len += len;
                range
            }
        };

        layout.spans.push(ElementSpan {
            print: print_range,
            braille: braille_range,
            lender,
        });
        layout.elements.push(element.clone());
        prev = Some(element);
    }

    place_images(&mut layout);
    trace!(
        elements = layout.elements.len(),
        markers = layout.count_markers(),
        print_len = layout.print_len,
        braille_len = layout.braille_len,
        "set_white_space"
    );
    layout
}

/// Give each image placeholder the range between its real neighbours
fn place_images(layout: &mut Layout) {
    let is_real = |e: &MappedElement| !e.is_white_space() && e.kind != ElementKind::Image;
    for i in 0..layout.elements.len() {
        if layout.elements[i].kind != ElementKind::Image {
            continue;
        }
        let prev = layout.elements[..i].iter().rposition(is_real);
        let next = layout.elements[i + 1..]
            .iter()
            .position(is_real)
            .map(|p| p + i + 1);
        let breaks = layout.elements[i + 1..next.unwrap_or(layout.elements.len())]
            .iter()
            .filter(|e| e.is_line_break())
            .count();

        let place = |range_of: fn(&ElementSpan) -> ViewRange, total: usize| {
            let start = prev.map(|p| range_of(&layout.spans[p]).end).unwrap_or(0);
            let end = next
                .map(|n| range_of(&layout.spans[n]).start.saturating_sub(breaks))
                .unwrap_or(total);
            ViewRange::new(start.min(end), end)
        };
        let print = place(|s| s.print, layout.print_len);
        let braille = place(|s| s.braille, layout.braille_len);
        layout.spans[i].print = print;
        layout.spans[i].braille = braille;
    }
}
