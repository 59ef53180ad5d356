//! Windowing engine
//!
//! Keeps a contiguous run of sections loaded into the live MapList, bounded
//! by a character budget. The section the caret needs and its immediate
//! neighbours are always loaded, even when they alone exceed the budget.
//! Further neighbours are added next-first, alternating, while the window is
//! under budget, so past that core a window never holds more than the
//! budget plus one section.
//!
//! Every window change writes the live elements back to their sections,
//! lays the new window out from scratch and rewrites both views in full.
//! The MapList is replaced in one step, so no reader sees a half-built
//! window.

use std::ops::Range;

use tracing::{debug, warn};

use super::buffer::DualView;
use super::whitespace::set_white_space;
use crate::config::ViewConfig;
use crate::dom::DocumentAccess;
use crate::error::{Error, Result};
use crate::init::Initializer;
use crate::map::{MapList, Section};

/// Which edge of the window to grow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug)]
pub struct ViewInitializer {
    sections: Vec<Section>,
    loaded: Range<usize>,
    config: ViewConfig,
}

impl ViewInitializer {
    pub fn new(sections: Vec<Section>, config: &ViewConfig) -> Self {
        ViewInitializer {
            sections,
            loaded: 0..0,
            config: config.clone(),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Range of sections currently in the live list
    pub fn loaded(&self) -> Range<usize> {
        self.loaded.clone()
    }

    /// Print chars of the loaded sections
    pub fn loaded_chars(&self) -> usize {
        self.sections[self.loaded.clone()].iter().map(|s| s.chars).sum()
    }

    /// Load the first window of the document
    pub fn initialize<D: DocumentAccess>(&mut self, doc: &D, list: &mut MapList, views: &mut DualView) -> Result<()> {
        self.reset_views(doc, list, views, 0)
    }

    /// Return the live content elements to their sections. Whitespace
    /// markers are dropped; section char counts are refreshed.
    pub fn write_back<D: DocumentAccess>(&mut self, doc: &D, list: &mut MapList) {
        let last = self.sections.len().saturating_sub(1);
        for element in list.take_elements() {
            if element.is_white_space() {
                continue;
            }
            let index = element.section.min(last);
            if let Some(section) = self.sections.get_mut(index) {
                section.elements.push(element);
            }
        }
        for index in self.loaded.clone() {
            if let Some(section) = self.sections.get_mut(index) {
                section.in_view = false;
                section.recount(doc);
            }
        }
        self.loaded = 0..0;
    }

    /// Rebuild the window around section `index`
    pub fn reset_views<D: DocumentAccess>(
        &mut self,
        doc: &D,
        list: &mut MapList,
        views: &mut DualView,
        index: usize,
    ) -> Result<()> {
        self.write_back(doc, list);
        if self.sections.is_empty() {
            self.sections.push(Section::new());
        }
        let target = index.min(self.sections.len() - 1);
        let range = self.window_around(target);
        self.load(doc, list, views, range, target);
        Ok(())
    }

    /// Shift the window one section toward `target`, which must sit just
    /// past the window edge in `direction`
    pub fn buffer_views<D: DocumentAccess>(
        &mut self,
        doc: &D,
        list: &mut MapList,
        views: &mut DualView,
        target: usize,
        direction: Direction,
    ) -> Result<()> {
        if self.loaded.is_empty() {
            return self.reset_views(doc, list, views, target);
        }
        let adjacent = match direction {
            Direction::Forward => target == self.loaded.end && target < self.sections.len(),
            Direction::Backward => self.loaded.start > 0 && target + 1 == self.loaded.start,
        };
        if !adjacent {
            return Err(Error::InvalidArgument(format!(
                "section {} is not adjacent to window {:?} going {:?}",
                target, self.loaded, direction
            )));
        }

        let old = self.loaded.clone();
        let caret = list.current_element().map_or(target, |e| e.section);
        self.write_back(doc, list);

        let mut range = match direction {
            Direction::Forward => old.start..target + 1,
            Direction::Backward => target..old.end,
        };
        let chars = |r: &Range<usize>| -> usize { self.sections[r.clone()].iter().map(|s| s.chars).sum() };
        let budget = self.config.window_budget;
        let limit = budget + self.sections[target].chars;
        // the caret's section, its neighbours and the target are never evicted
        let keep_from = caret.saturating_sub(1).min(target);
        let keep_to = (caret + 2).min(self.sections.len()).max(target + 1);
        let mut total = chars(&range);
        let mut evict = total > budget;
        while evict {
            match direction {
                Direction::Forward if range.start < keep_from => range.start += 1,
                Direction::Backward if range.end > keep_to => range.end -= 1,
                _ => break,
            }
            total = chars(&range);
            evict = total > limit;
        }
        debug!(
            target,
            caret,
            ?direction,
            from = ?old,
            to = ?range,
            chars = total,
            "buffer_views"
        );
        self.load(doc, list, views, range, target);
        Ok(())
    }

    /// Re-run the Initializer over the whole tree, then rebuild the window
    /// around section `index`
    pub fn reformat_views<D: DocumentAccess>(
        &mut self,
        doc: &D,
        list: &mut MapList,
        views: &mut DualView,
        index: usize,
    ) -> Result<()> {
        let sections = match doc.root_element_id() {
            Some(root) => Initializer::new(&self.config).build(doc, root)?,
            None => vec![Section::new()],
        };
        // the live elements belong to the old partition
        list.take_elements();
        self.sections = sections;
        self.loaded = 0..0;
        self.reset_views(doc, list, views, index)
    }

    /// Target section and its neighbours, then further sections, next
    /// first, while under budget
    fn window_around(&self, target: usize) -> Range<usize> {
        let count = self.sections.len();
        let budget = self.config.window_budget;
        let mut range = target.saturating_sub(1)..(target + 2).min(count);
        let mut total: usize = self.sections[range.clone()].iter().map(|s| s.chars).sum();
        let mut forward = true;
        while total < budget {
            let can_next = range.end < count;
            let can_prev = range.start > 0;
            if !can_next && !can_prev {
                break;
            }
            if can_next && (forward || !can_prev) {
                total += self.sections[range.end].chars;
                range.end += 1;
            } else {
                range.start -= 1;
                total += self.sections[range.start].chars;
            }
            forward = !forward;
        }
        range
    }

    fn load<D: DocumentAccess>(
        &mut self,
        doc: &D,
        list: &mut MapList,
        views: &mut DualView,
        range: Range<usize>,
        target: usize,
    ) {
        let mut content = Vec::new();
        for section in &mut self.sections[range.clone()] {
            section.in_view = true;
            content.extend(section.take_elements());
        }
        let layout = set_white_space(doc, content, range.start == 0, self.config.default_tab_width);
        views.rewrite(&layout.print, &layout.braille);
        list.install(layout.elements, layout.spans, layout.print_len, layout.braille_len);
        self.loaded = range.clone();

        if list.current_index().is_err() {
            let first = list
                .iter()
                .position(|e| e.section == target && !e.is_white_space())
                .or_else(|| (!list.is_empty()).then_some(0));
            if let Some(index) = first {
                if let Err(err) = list.set_current(index) {
                    warn!(index, %err, "cannot place the caret in the new window");
                }
            }
        }
        if let Ok(span) = list.current_index().and_then(|i| list.span(i)) {
            views.print.set_caret_offset(span.print.start);
            views.braille.set_caret_offset(span.braille.start);
        }
        let chars: usize = self.sections[range.clone()].iter().map(|s| s.chars).sum();
        debug!(
            start = range.start,
            end = range.end,
            chars,
            print_len = views.print.char_count(),
            "window loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    /// Ten blocks of ten chars; threshold 5 puts each block in its own section
    fn doc() -> Document {
        let mut xml = String::from("<book>");
        for i in 0..10 {
            xml.push_str(&format!(r#"<p type="block">block{i:04}a</p>"#));
        }
        xml.push_str("</book>");
        Document::parse(&xml).unwrap()
    }

    fn setup(budget: usize) -> (Document, ViewInitializer, MapList, DualView) {
        let doc = doc();
        let config = ViewConfig::default()
            .with_section_threshold(5)
            .with_window_budget(budget);
        let root = doc.root_element_id().unwrap();
        let sections = Initializer::new(&config).build(&doc, root).unwrap();
        assert_eq!(sections.len(), 10);
        let mut window = ViewInitializer::new(sections, &config);
        let mut list = MapList::new();
        let mut views = DualView::in_memory();
        window.initialize(&doc, &mut list, &mut views).unwrap();
        (doc, window, list, views)
    }

    #[test]
    fn test_initialize_fills_budget() {
        let (_, window, list, views) = setup(25);
        // 10 + 10 < 25, third section pushes past
        assert_eq!(window.loaded(), 0..3);
        assert_eq!(list.print_len().unwrap(), views.print.char_count());
        assert_eq!(views.print.text(), "block0000a\nblock0001a\nblock0002a");
        assert!(window.sections()[0].in_view);
        assert!(window.sections()[0].is_empty());
        assert!(!window.sections()[3].in_view);
    }

    #[test]
    fn test_reset_alternates_neighbours() {
        let (doc, mut window, mut list, mut views) = setup(35);
        list.set_current(0).unwrap();
        window.reset_views(&doc, &mut list, &mut views, 5).unwrap();
        // 4..=6 always, then 7
        assert_eq!(window.loaded(), 4..8);
        // window starts past section 0: no leading break
        assert!(views.print.text().starts_with("block0004a"));
        // the old caret element is out of view; caret moves to the target
        let current = list.current_element().unwrap();
        assert_eq!(current.section, 5);
    }

    #[test]
    fn test_buffer_forward_and_back() {
        let (doc, mut window, mut list, mut views) = setup(25);
        // caret on the last block, as when scrolling down
        list.set_current(list.len() - 1).unwrap();
        window
            .buffer_views(&doc, &mut list, &mut views, 3, Direction::Forward)
            .unwrap();
        assert_eq!(window.loaded(), 1..4);
        assert!(window.loaded_chars() <= 25 + 10);
        list.set_current(0).unwrap();
        assert_eq!(list.current_element().unwrap().section, 1);
        window
            .buffer_views(&doc, &mut list, &mut views, 0, Direction::Backward)
            .unwrap();
        assert_eq!(window.loaded(), 0..3);
        // every section's elements are back home or live
        let stored: usize = window.sections().iter().map(Section::len).sum();
        let live = list.iter().filter(|e| !e.is_white_space()).count();
        assert_eq!(stored + live, 10);
    }

    #[test]
    fn test_buffer_keeps_caret_in_window() {
        let (doc, mut window, mut list, mut views) = setup(25);
        list.set_current(list.len() - 1).unwrap();
        let node = list.current_element().unwrap().node;
        window
            .buffer_views(&doc, &mut list, &mut views, 3, Direction::Forward)
            .unwrap();
        assert_eq!(list.current_element().unwrap().node, node);
        let span = list.span(list.current_index().unwrap()).unwrap();
        assert_eq!(views.print.caret_offset(), span.print.start);
    }

    #[test]
    fn test_buffer_rejects_non_adjacent() {
        let (doc, mut window, mut list, mut views) = setup(25);
        let err = window
            .buffer_views(&doc, &mut list, &mut views, 7, Direction::Forward)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(window.loaded(), 0..3);
    }

    #[test]
    fn test_window_never_exceeds_budget_plus_one() {
        let (doc, mut window, mut list, mut views) = setup(25);
        for target in 3..10 {
            list.set_current(list.len() - 1).unwrap();
            window
                .buffer_views(&doc, &mut list, &mut views, target, Direction::Forward)
                .unwrap();
            assert!(window.loaded_chars() <= 25 + 10);
            assert_eq!(window.loaded(), target - 2..target + 1);
        }
    }

    #[test]
    fn test_caret_section_survives_tight_budget() {
        // every section alone is over budget
        let (doc, mut window, mut list, mut views) = setup(5);
        assert_eq!(window.loaded(), 0..2);
        let node = list.current_element().unwrap().node;
        assert_eq!(list.current_element().unwrap().section, 0);

        window
            .buffer_views(&doc, &mut list, &mut views, 2, Direction::Forward)
            .unwrap();
        assert_eq!(window.loaded(), 0..3);
        assert_eq!(list.current_element().unwrap().node, node);

        // moving on with the caret pulls the window along
        list.set_current(list.len() - 1).unwrap();
        window
            .buffer_views(&doc, &mut list, &mut views, 3, Direction::Forward)
            .unwrap();
        assert_eq!(window.loaded(), 1..4);
        assert_eq!(list.current_element().unwrap().section, 2);
    }

    #[test]
    fn test_reset_loads_neighbours_over_budget() {
        let (doc, mut window, mut list, mut views) = setup(5);
        window.reset_views(&doc, &mut list, &mut views, 6).unwrap();
        assert_eq!(window.loaded(), 5..8);
        window.reset_views(&doc, &mut list, &mut views, 9).unwrap();
        assert_eq!(window.loaded(), 8..10);
    }

    #[test]
    fn test_reformat_views_picks_up_tree_changes() {
        let (mut doc, mut window, mut list, mut views) = setup(25);
        let first_text = list.iter().find_map(|e| e.node).unwrap();
        doc.set_text(first_text, "changed").unwrap();
        window.reformat_views(&doc, &mut list, &mut views, 0).unwrap();
        assert!(views.print.text().starts_with("changed\n"));
    }
}
