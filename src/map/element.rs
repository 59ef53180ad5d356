//! Mapped Element Types
//!
//! A mapped element bridges one tree node (or a synthetic whitespace marker)
//! to a contiguous span in the print and braille views. Elements hold
//! non-owning `NodeId`s; their text is read from the tree on demand, so the
//! tree stays the only place document content lives. Offsets are never
//! stored here: they are derived by the layout pass (see `span`).

use std::fmt;

use crate::dom::{char_len, DocumentAccess, NodeId};
use crate::vocab;

/// Synthetic whitespace marker flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhiteSpaceKind {
    /// One line break between blocks (editable)
    LineBreak,
    /// Indentation at the start of a line
    Formatting,
    /// Gap up to a tab stop
    Horizontal,
    /// Next to a page indicator or box line
    Painted,
    /// Next to read-only content
    ReadOnlyFormatting,
}

impl WhiteSpaceKind {
    /// Markers that may be turned into a new block. Indents and tab gaps
    /// sit inside a line that already belongs to a block.
    pub fn is_editable(self) -> bool {
        matches!(self, WhiteSpaceKind::LineBreak)
    }
}

impl fmt::Display for WhiteSpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WhiteSpaceKind::LineBreak => "line break",
            WhiteSpaceKind::Formatting => "formatting",
            WhiteSpaceKind::Horizontal => "horizontal",
            WhiteSpaceKind::Painted => "painted",
            WhiteSpaceKind::ReadOnlyFormatting => "read-only formatting",
        };
        f.write_str(name)
    }
}

/// What a whitespace marker renders as (identically in both views)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filler {
    /// A single `\n`
    LineBreak,
    /// `n` spaces
    Spaces(usize),
}

impl Filler {
    pub fn len(self) -> usize {
        match self {
            Filler::LineBreak => 1,
            Filler::Spaces(n) => n,
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn text(self) -> String {
        match self {
            Filler::LineBreak => "\n".to_string(),
            Filler::Spaces(n) => " ".repeat(n),
        }
    }
}

/// Structural kind of a mapped element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// Editable text node
    Text,
    /// Text node inside a read-only container
    ReadOnlyText,
    /// Simple table; `rows` holds the cell elements of each row
    Table { rows: Vec<Vec<NodeId>> },
    /// Tab span; the gap to its column is a `Horizontal` marker
    Tab,
    /// MathML expression
    Math,
    /// Image placeholder (zero length)
    Image,
    /// Print page number block
    PageIndicator,
    /// Opening or closing rule of a boxed container
    BoxLine { container: NodeId, end: bool },
    /// Synthetic marker created by the layout pass
    WhiteSpace { kind: WhiteSpaceKind, filler: Filler },
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::ReadOnlyText => "read-only text",
            ElementKind::Table { .. } => "table",
            ElementKind::Tab => "tab",
            ElementKind::Math => "math",
            ElementKind::Image => "image",
            ElementKind::PageIndicator => "page indicator",
            ElementKind::BoxLine { .. } => "box line",
            ElementKind::WhiteSpace { .. } => "whitespace",
        }
    }
}

/// Sub-kinds of generated braille
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrailleKind {
    /// Plain braille text node
    Text,
    PageNumber,
    GuideWord,
    Uncontracted,
    Pronunciation,
    /// Braille page break; occupies no characters
    PageBreak,
}

/// One span of generated braille owned by a mapped element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrailleMappedElement {
    pub node: NodeId,
    pub kind: BrailleKind,
}

impl BrailleMappedElement {
    pub fn new(node: NodeId, kind: BrailleKind) -> Self {
        BrailleMappedElement { node, kind }
    }

    pub fn text<D: DocumentAccess>(&self, doc: &D) -> String {
        match self.kind {
            BrailleKind::PageBreak => String::new(),
            BrailleKind::Text => doc.text_content(self.node).unwrap_or_default().to_string(),
            _ => vocab::all_text(doc, self.node),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedElement {
    pub kind: ElementKind,
    /// Backing node; `None` for whitespace markers and closing box lines
    pub node: Option<NodeId>,
    pub braille: Vec<BrailleMappedElement>,
    pub read_only: bool,
    /// Layout block this element sits in
    pub block: Option<NodeId>,
    /// Index of the owning section
    pub section: usize,
}

impl MappedElement {
    pub fn new(kind: ElementKind, node: Option<NodeId>, block: Option<NodeId>) -> Self {
        let read_only = matches!(
            kind,
            ElementKind::ReadOnlyText
                | ElementKind::Table { .. }
                | ElementKind::Math
                | ElementKind::PageIndicator
        );
        MappedElement {
            kind,
            node,
            braille: Vec::new(),
            read_only,
            block,
            section: 0,
        }
    }

    pub fn text(node: NodeId, block: Option<NodeId>) -> Self {
        Self::new(ElementKind::Text, Some(node), block)
    }

    pub fn white_space(kind: WhiteSpaceKind, filler: Filler, block: Option<NodeId>, section: usize) -> Self {
        MappedElement {
            kind: ElementKind::WhiteSpace { kind, filler },
            node: None,
            braille: Vec::new(),
            read_only: kind == WhiteSpaceKind::ReadOnlyFormatting,
            block,
            section,
        }
    }

    pub fn is_white_space(&self) -> bool {
        matches!(self.kind, ElementKind::WhiteSpace { .. })
    }

    pub fn white_space_kind(&self) -> Option<WhiteSpaceKind> {
        match self.kind {
            ElementKind::WhiteSpace { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn is_line_break(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::WhiteSpace {
                filler: Filler::LineBreak,
                ..
            }
        )
    }

    /// Node used for tree-relative queries; closing box lines answer with
    /// their container
    pub fn anchor_node(&self) -> Option<NodeId> {
        match self.kind {
            ElementKind::BoxLine { container, .. } => Some(container),
            _ => self.node,
        }
    }

    /// Text this element contributes to the print view
    pub fn print_text<D: DocumentAccess>(&self, doc: &D) -> String {
        match &self.kind {
            ElementKind::WhiteSpace { filler, .. } => filler.text(),
            ElementKind::Tab | ElementKind::Image | ElementKind::BoxLine { .. } => String::new(),
            ElementKind::Text | ElementKind::ReadOnlyText => match self.node {
                Some(node) => doc.text_content(node).unwrap_or_default().to_string(),
                None => String::new(),
            },
            ElementKind::Table { rows } => rows
                .iter()
                .map(|cells| {
                    cells
                        .iter()
                        .map(|&cell| vocab::print_text(doc, cell))
                        .collect::<Vec<_>>()
                        .join("  ")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            ElementKind::Math | ElementKind::PageIndicator => match self.node {
                Some(node) => vocab::print_text(doc, node),
                None => String::new(),
            },
        }
    }

    /// Text this element contributes to the braille view (before borrowing)
    pub fn braille_text<D: DocumentAccess>(&self, doc: &D) -> String {
        match &self.kind {
            ElementKind::WhiteSpace { filler, .. } => filler.text(),
            _ => self.braille.iter().map(|b| b.text(doc)).collect(),
        }
    }

    pub fn print_len<D: DocumentAccess>(&self, doc: &D) -> usize {
        match &self.kind {
            ElementKind::WhiteSpace { filler, .. } => filler.len(),
            _ => char_len(&self.print_text(doc)),
        }
    }
}
