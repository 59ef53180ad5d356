//! View ranges - derived offsets of mapped elements
//!
//! Offsets are char positions in a rendered view. They are computed by the
//! layout pass for the live window and cached on the MapList; nothing else
//! stores them.

/// Which of the two rendered views an offset refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Print,
    Braille,
}

/// Half-open char range `[start, end)` in one view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewRange {
    pub start: usize,
    pub end: usize,
}

impl ViewRange {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty range at `offset`
    #[inline]
    pub const fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[inline]
    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// True when the range shares at least one position with `[start, end)`.
    /// Empty ranges intersect when they sit inside the selection.
    pub const fn intersects(&self, start: usize, end: usize) -> bool {
        if self.is_empty() {
            start <= self.start && self.start < end
        } else {
            self.start < end && self.end > start
        }
    }
}

/// Derived position of one mapped element in both views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementSpan {
    pub print: ViewRange,
    pub braille: ViewRange,
    /// Index of the element whose braille this one borrows, if any
    pub lender: Option<usize>,
}

impl ElementSpan {
    pub fn range(&self, view: View) -> ViewRange {
        match view {
            View::Print => self.print,
            View::Braille => self.braille,
        }
    }
}
