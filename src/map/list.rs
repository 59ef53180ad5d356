//! MapList - the live, windowed sequence of mapped elements
//!
//! Holds the elements of every in-view section in document order together
//! with the span cache written by the layout pass. Structural mutations
//! mark the cache dirty; offset queries on a dirty list fail with
//! [`MapListError::StaleOffsets`] until the window is laid out again.
//!
//! The caret is a [`StableElementHandle`], resolved on demand, so a cursor
//! left behind by a structural edit is reported as stale instead of silently
//! pointing at a different element.

use std::collections::BTreeSet;

use tracing::trace;

use super::element::MappedElement;
use super::handle::StableElementHandle;
use super::span::{ElementSpan, View};
use crate::dom::{axes, Document, DocumentAccess, NodeId};
use crate::error::MapListError;

#[derive(Debug, Clone, Default)]
pub struct MapList {
    elements: Vec<MappedElement>,
    spans: Vec<ElementSpan>,
    print_len: usize,
    braille_len: usize,
    spans_dirty: bool,
    current: Option<StableElementHandle>,
}

impl MapList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unlaid-out list over `elements`
    pub fn from_elements(elements: Vec<MappedElement>) -> Self {
        let spans_dirty = !elements.is_empty();
        MapList {
            elements,
            spans_dirty,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[MappedElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MappedElement> {
        self.elements.iter()
    }

    fn check_index(&self, index: usize) -> Result<(), MapListError> {
        if index < self.elements.len() {
            Ok(())
        } else {
            Err(MapListError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            })
        }
    }

    pub fn element_at(&self, index: usize) -> Result<&MappedElement, MapListError> {
        self.check_index(index)?;
        Ok(&self.elements[index])
    }

    pub fn element_at_mut(&mut self, index: usize) -> Result<&mut MappedElement, MapListError> {
        self.check_index(index)?;
        self.spans_dirty = true;
        Ok(&mut self.elements[index])
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn insert(&mut self, index: usize, element: MappedElement) -> Result<(), MapListError> {
        if index > self.elements.len() {
            return Err(MapListError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            });
        }
        self.elements.insert(index, element);
        self.spans_dirty = true;
        Ok(())
    }

    pub fn push(&mut self, element: MappedElement) {
        self.elements.push(element);
        self.spans_dirty = true;
    }

    pub fn remove(&mut self, index: usize) -> Result<MappedElement, MapListError> {
        self.check_index(index)?;
        self.spans_dirty = true;
        Ok(self.elements.remove(index))
    }

    /// Remove `first..=last`
    pub fn remove_range(&mut self, first: usize, last: usize) -> Result<Vec<MappedElement>, MapListError> {
        self.check_index(last)?;
        if first > last {
            return Err(MapListError::IndexOutOfRange {
                index: first,
                len: self.elements.len(),
            });
        }
        self.spans_dirty = true;
        Ok(self.elements.drain(first..=last).collect())
    }

    /// Drop node-backed elements whose node has been detached from the tree.
    /// Returns the number removed.
    pub fn retain_attached(&mut self, doc: &Document) -> usize {
        let before = self.elements.len();
        self.elements
            .retain(|e| e.anchor_node().is_none_or(|node| doc.is_attached(node)));
        let removed = before - self.elements.len();
        if removed > 0 {
            self.spans_dirty = true;
        }
        removed
    }

    /// Empty the list, handing the elements back (the caret handle is kept)
    pub fn take_elements(&mut self) -> Vec<MappedElement> {
        self.spans.clear();
        self.print_len = 0;
        self.braille_len = 0;
        self.spans_dirty = false;
        std::mem::take(&mut self.elements)
    }

    /// Replace the contents with a laid-out window
    pub fn install(
        &mut self,
        elements: Vec<MappedElement>,
        spans: Vec<ElementSpan>,
        print_len: usize,
        braille_len: usize,
    ) {
        debug_assert_eq!(elements.len(), spans.len());
        self.elements = elements;
        self.spans = spans;
        self.print_len = print_len;
        self.braille_len = braille_len;
        self.spans_dirty = false;
    }

    pub fn mark_dirty(&mut self) {
        self.spans_dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.spans_dirty
    }

    // ------------------------------------------------------------------
    // Offsets
    // ------------------------------------------------------------------

    fn check_clean(&self) -> Result<(), MapListError> {
        if self.spans_dirty {
            Err(MapListError::StaleOffsets)
        } else {
            Ok(())
        }
    }

    pub fn span(&self, index: usize) -> Result<ElementSpan, MapListError> {
        self.check_clean()?;
        self.check_index(index)?;
        Ok(self.spans[index])
    }

    /// Print view char count of the window
    pub fn print_len(&self) -> Result<usize, MapListError> {
        self.check_clean()?;
        Ok(self.print_len)
    }

    /// Braille view char count of the window
    pub fn braille_len(&self) -> Result<usize, MapListError> {
        self.check_clean()?;
        Ok(self.braille_len)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Index of the element backed by `node`
    pub fn index_of(&self, node: NodeId) -> Result<usize, MapListError> {
        self.elements
            .iter()
            .position(|e| e.node == Some(node))
            .ok_or(MapListError::NodeNotFound(node))
    }

    fn holds(&self, index: usize, offset: usize, view: View) -> bool {
        let range = self.spans[index].range(view);
        if range.contains(offset) {
            return true;
        }
        if range.is_empty() && range.start == offset {
            // a placeholder yields to a neighbour that spans the offset
            let spans = |i: usize| self.spans.get(i).is_some_and(|s| s.range(view).contains(offset));
            return !(index.checked_sub(1).is_some_and(spans) || spans(index + 1));
        }
        index + 1 == self.elements.len() && offset == range.end
    }

    /// Element at `offset` in `view`, searched within `lo..=hi`.
    ///
    /// The caret element and its neighbours are tried first; sequential
    /// edits rarely move far. Otherwise a binary search over start offsets.
    /// Offsets past the window resolve to `hi`.
    pub fn find_closest(&self, offset: usize, view: View, lo: usize, hi: usize) -> Result<usize, MapListError> {
        self.check_clean()?;
        if self.elements.is_empty() {
            return Err(MapListError::Empty);
        }
        self.check_index(hi)?;
        let lo = lo.min(hi);

        if let Ok(seed) = self.current_index() {
            let seed = seed.clamp(lo, hi);
            let neighbours = [Some(seed), seed.checked_sub(1), seed.checked_add(1)];
            for candidate in neighbours.into_iter().flatten() {
                if (lo..=hi).contains(&candidate) && self.holds(candidate, offset, view) {
                    trace!(offset, candidate, "find_closest hit near caret");
                    return Ok(candidate);
                }
            }
        }

        let window = &self.spans[lo..=hi];
        let mut index = lo + window
            .partition_point(|s| s.range(view).start <= offset)
            .saturating_sub(1);
        // Borrowed braille ranges and image placeholders break start
        // monotonicity locally; settle on a neighbour that holds the offset.
        while index > lo && self.spans[index].range(view).start > offset {
            index -= 1;
        }
        while index < hi
            && self.spans[index].range(view).end <= offset
            && self.spans[index + 1].range(view).start <= offset
            && !self.holds(index, offset, view)
        {
            index += 1;
        }
        trace!(offset, index, "find_closest binary search");
        Ok(index)
    }

    /// First and last index of the elements under `ancestor`, expanding from
    /// `index` (which must itself be under it). Whitespace markers inside
    /// the run are included; markers at its edges are not.
    pub fn find_text_map_element_range<D: DocumentAccess>(
        &self,
        doc: &D,
        index: usize,
        ancestor: NodeId,
    ) -> Result<(usize, usize), MapListError> {
        let under = |i: usize| {
            self.elements[i]
                .anchor_node()
                .map(|node| node == ancestor || axes::is_ancestor(doc, ancestor, node))
        };
        self.check_index(index)?;
        if under(index) != Some(true) {
            return Err(MapListError::NotUnderAncestor { index, ancestor });
        }

        let mut first = index;
        let mut i = index;
        while i > 0 {
            i -= 1;
            match under(i) {
                Some(true) => first = i,
                Some(false) => break,
                None => {}
            }
        }
        let mut last = index;
        for j in index + 1..self.elements.len() {
            match under(j) {
                Some(true) => last = j,
                Some(false) => break,
                None => {}
            }
        }
        Ok((first, last))
    }

    /// Nearest element before `index` that is not a whitespace marker
    pub fn find_previous_non_whitespace(&self, index: usize) -> Option<usize> {
        let end = index.min(self.elements.len());
        self.elements[..end].iter().rposition(|e| !e.is_white_space())
    }

    /// Nearest element after `index` that is not a whitespace marker
    pub fn find_next_non_whitespace(&self, index: usize) -> Option<usize> {
        let start = index.checked_add(1)?;
        if start >= self.elements.len() {
            return None;
        }
        self.elements[start..]
            .iter()
            .position(|e| !e.is_white_space())
            .map(|p| p + start)
    }

    /// Indices of every element whose print span intersects `[start, end)`
    pub fn get_element_in_selected_range(&self, start: usize, end: usize) -> Result<BTreeSet<usize>, MapListError> {
        self.check_clean()?;
        Ok(self
            .spans
            .iter()
            .enumerate()
            .filter(|(_, span)| span.print.intersects(start, end))
            .map(|(i, _)| i)
            .collect())
    }

    // ------------------------------------------------------------------
    // Caret
    // ------------------------------------------------------------------

    /// Point the caret at `index`
    pub fn set_current(&mut self, index: usize) -> Result<(), MapListError> {
        self.check_index(index)?;
        self.current = StableElementHandle::at(&self.elements, index);
        Ok(())
    }

    pub fn set_current_handle(&mut self, handle: StableElementHandle) {
        self.current = Some(handle);
    }

    pub fn current_handle(&self) -> Option<StableElementHandle> {
        self.current
    }

    /// Resolve the caret. A list without a caret reports its first element.
    pub fn current_index(&self) -> Result<usize, MapListError> {
        match self.current {
            Some(handle) => handle.resolve(&self.elements).ok_or(MapListError::StaleHandle),
            None if self.elements.is_empty() => Err(MapListError::Empty),
            None => Ok(0),
        }
    }

    pub fn current_element(&self) -> Result<&MappedElement, MapListError> {
        let index = self.current_index()?;
        Ok(&self.elements[index])
    }
}
