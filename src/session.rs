//! Editing session
//!
//! The single writer. A session owns the tree, the sections, the live
//! MapList, both views, the translation engine and the event bus, and runs
//! every edit through the same cycle: handler, engine, window rebuild,
//! caret re-anchor, events. A failed edit rebuilds the window from the tree
//! as it stands and reports the error.

use tracing::{debug, warn};

use crate::config::ViewConfig;
use crate::dom::{Document, NodeId};
use crate::edit::{self, EditOutcome, Position};
use crate::error::{EditError, LoadError, Result};
use crate::init::Initializer;
use crate::map::{MapList, StableElementHandle, View};
use crate::search::SectionMapSearcher;
use crate::translate::{ReformatRequest, TranslationEngine};
use crate::view::{Direction, DualView, EventBus, SubscriberId, ViewBuffer, ViewEvent, ViewInitializer};

pub struct Session<E: TranslationEngine> {
    doc: Document,
    engine: E,
    config: ViewConfig,
    window: ViewInitializer,
    list: MapList,
    views: DualView,
    searcher: SectionMapSearcher,
    bus: EventBus,
}

impl<E: TranslationEngine> Session<E> {
    /// Open a session over `doc` with in-memory views
    pub fn new(doc: Document, engine: E, config: ViewConfig) -> Result<Self> {
        Self::with_views(doc, engine, config, DualView::in_memory())
    }

    /// Open a session rendering into caller-supplied views
    pub fn with_views(doc: Document, engine: E, config: ViewConfig, mut views: DualView) -> Result<Self> {
        config.validate()?;
        let root = doc.root_element_id().ok_or(LoadError::NoRoot)?;
        let sections = Initializer::new(&config).build(&doc, root)?;
        let mut window = ViewInitializer::new(sections, &config);
        let mut list = MapList::new();
        window.initialize(&doc, &mut list, &mut views)?;
        debug!(
            sections = window.section_count(),
            loaded = ?window.loaded(),
            "session opened"
        );
        Ok(Session {
            doc,
            engine,
            searcher: SectionMapSearcher::new(&config),
            config,
            window,
            list,
            views,
            bus: EventBus::new(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Hand the tree back, ending the session
    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn list(&self) -> &MapList {
        &self.list
    }

    pub fn views(&self) -> &DualView {
        &self.views
    }

    pub fn window(&self) -> &ViewInitializer {
        &self.window
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Index of the caret element in the live list
    pub fn caret(&self) -> Option<usize> {
        self.list.current_index().ok()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ViewEvent) + Send + 'static) -> SubscriberId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn caret_section(&self) -> usize {
        self.list
            .current_element()
            .map(|e| e.section)
            .unwrap_or(self.window.loaded().start)
    }

    fn window_changed(&mut self) {
        self.bus.emit(&ViewEvent::WindowChanged {
            sections: self.window.loaded(),
        });
    }

    /// Run one handler through the full edit cycle
    pub fn apply<F>(&mut self, handler: F) -> Result<EditOutcome>
    where
        F: FnOnce(&mut Document, &mut MapList) -> std::result::Result<EditOutcome, EditError>,
    {
        let section = self.caret_section();
        let outcome = match handler(&mut self.doc, &mut self.list) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%err, section, "edit failed; rebuilding window");
                self.window
                    .reformat_views(&self.doc, &mut self.list, &mut self.views, section)?;
                self.window_changed();
                return Err(err.into());
            }
        };

        let translated = self.engine.reformat(&mut self.doc, &outcome.reformat);
        if let Err(err) = &translated {
            warn!(%err, nodes = ?outcome.reformat.nodes, "translation engine failed");
        }

        self.searcher.invalidate();
        self.list.set_current_handle(outcome.caret);
        self.window
            .reformat_views(&self.doc, &mut self.list, &mut self.views, section)?;
        if outcome.caret.resolve(self.list.elements()).is_none() {
            if let Some(node) = outcome.caret.reference_node() {
                self.navigate_to(node)?;
            }
        }
        debug!(
            section,
            modified = outcome.modified.len(),
            loaded = ?self.window.loaded(),
            "edit applied"
        );
        self.bus.emit(&ViewEvent::Modified {
            nodes: outcome.modified.clone(),
        });
        self.window_changed();
        translated?;
        Ok(outcome)
    }

    /// Retranslate the whole document and rebuild the window
    pub fn retranslate(&mut self) -> Result<()> {
        let root = self.doc.root_element_id().ok_or(LoadError::NoRoot)?;
        let section = self.caret_section();
        self.engine
            .reformat(&mut self.doc, &ReformatRequest::new(vec![root], true))?;
        self.searcher.invalidate();
        self.window
            .reformat_views(&self.doc, &mut self.list, &mut self.views, section)?;
        self.window_changed();
        Ok(())
    }

    pub fn edit_text(&mut self, index: usize, text: &str) -> Result<EditOutcome> {
        self.apply(|doc, list| edit::edit_text(doc, list, index, text))
    }

    pub fn insert_element(&mut self, index: usize, position: Position, tag: &str, text: &str) -> Result<EditOutcome> {
        self.apply(|doc, list| edit::insert_element(doc, list, index, position, tag, text))
    }

    pub fn remove_element(&mut self, index: usize) -> Result<EditOutcome> {
        self.apply(|doc, list| edit::remove_element(doc, list, index))
    }

    pub fn merge_blocks(&mut self, index: usize) -> Result<EditOutcome> {
        self.apply(|doc, list| edit::merge_blocks(doc, list, index))
    }

    pub fn apply_style(&mut self, index: usize, style: &str) -> Result<EditOutcome> {
        self.apply(|doc, list| edit::apply_style(doc, list, index, style))
    }

    pub fn adjust_tab(&mut self, index: usize, column: usize) -> Result<EditOutcome> {
        self.apply(|doc, list| edit::adjust_tab(doc, list, index, column))
    }

    pub fn apply_emphasis(&mut self, start: usize, end: usize, emphasis: &str) -> Result<EditOutcome> {
        self.apply(|doc, list| edit::apply_emphasis(doc, list, start, end, emphasis))
    }

    pub fn remove_selection(&mut self, start: usize, end: usize) -> Result<EditOutcome> {
        self.apply(|doc, list| edit::remove_selection(doc, list, start, end))
    }

    pub fn materialize_white_space(&mut self, offset: usize, text: &str) -> Result<EditOutcome> {
        self.apply(|doc, list| edit::materialize_white_space(doc, list, offset, text))
    }

    /// Record a caret move from the UI. Reaching a section at the window
    /// edge buffers the neighbouring section in.
    pub fn caret_moved(&mut self, view: View, offset: usize) -> Result<()> {
        if self.list.is_empty() {
            self.bus.emit(&ViewEvent::CaretMoved { view, offset });
            return Ok(());
        }
        let index = self.list.find_closest(offset, view, 0, self.list.len() - 1)?;
        self.list.set_current(index)?;
        let within = offset.saturating_sub(self.list.span(index)?.range(view).start);
        self.buffer_of(view).set_caret_offset(offset);
        self.bus.emit(&ViewEvent::CaretMoved { view, offset });

        let section = self.list.element_at(index)?.section;
        let loaded = self.window.loaded();
        let step = if section + 1 == loaded.end && loaded.end < self.window.section_count() {
            Some((loaded.end, Direction::Forward))
        } else if section == loaded.start && loaded.start > 0 {
            Some((loaded.start - 1, Direction::Backward))
        } else {
            None
        };
        if let Some((target, direction)) = step {
            self.window
                .buffer_views(&self.doc, &mut self.list, &mut self.views, target, direction)?;
            // keep the caret where it was inside its element
            if let Ok(span) = self.list.current_index().and_then(|i| self.list.span(i)) {
                let start = span.range(view).start;
                self.buffer_of(view).set_caret_offset(start + within);
            }
            self.window_changed();
        }
        Ok(())
    }

    fn buffer_of(&mut self, view: View) -> &mut (dyn ViewBuffer + Send) {
        match view {
            View::Print => self.views.print.as_mut(),
            View::Braille => self.views.braille.as_mut(),
        }
    }

    /// Bring `node` into the window and put the caret on it. Returns false
    /// when no section holds the node.
    pub fn navigate_to(&mut self, node: NodeId) -> Result<bool> {
        if let Ok(index) = self.list.index_of(node) {
            self.list.set_current(index)?;
            return Ok(true);
        }
        let Some(hit) = self.searcher.search(self.window.sections(), node)? else {
            debug!(node, "navigate_to found nothing");
            return Ok(false);
        };
        self.list.set_current_handle(StableElementHandle::for_node(node));
        self.window
            .reset_views(&self.doc, &mut self.list, &mut self.views, hit.section)?;
        debug!(node, section = hit.section, "navigate_to loaded section");
        self.window_changed();
        Ok(true)
    }
}

impl<E: TranslationEngine + std::fmt::Debug> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.engine)
            .field("loaded", &self.window.loaded())
            .field("sections", &self.window.section_count())
            .field("elements", &self.list.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::translate::{EchoEngine, NullEngine};
    use std::sync::{Arc, Mutex};

    fn blocks(count: usize) -> Document {
        let mut xml = String::from("<book>");
        for i in 0..count {
            xml.push_str(&format!(r#"<p type="block">block{i:04}a</p>"#));
        }
        xml.push_str("</book>");
        Document::parse(&xml).unwrap()
    }

    fn small() -> ViewConfig {
        ViewConfig::default()
            .with_section_threshold(5)
            .with_window_budget(25)
            .with_search_threads(2)
    }

    #[test]
    fn test_open_single_block() {
        let doc = Document::parse(r#"<book><p type="block">Hello World</p></book>"#).unwrap();
        let session = Session::new(doc, NullEngine, ViewConfig::default()).unwrap();
        assert_eq!(session.list().len(), 1);
        assert_eq!(session.views().print.text(), "Hello World");
        assert_eq!(session.caret(), Some(0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let doc = blocks(1);
        let err = Session::new(doc, NullEngine, ViewConfig::default().with_window_budget(0)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_edit_runs_engine_and_rebuilds() {
        let doc = Document::parse(r#"<book><p type="block">abc</p></book>"#).unwrap();
        let mut session = Session::new(doc, EchoEngine, ViewConfig::default()).unwrap();
        session.edit_text(0, "xyz").unwrap();
        assert_eq!(session.views().print.text(), "xyz");
        assert_eq!(session.views().braille.text(), "XYZ");
        assert_eq!(session.caret(), Some(0));
    }

    #[test]
    fn test_failed_edit_leaves_tree_and_window() {
        let doc = Document::parse(
            r#"<book><g type="container" subtype="matrix"><p type="block">1 2</p></g></book>"#,
        )
        .unwrap();
        let mut session = Session::new(doc, NullEngine, ViewConfig::default()).unwrap();
        let before = session.document().to_xml();
        let err = session.edit_text(0, "x").unwrap_err();
        assert!(matches!(err, Error::Edit(EditError::ReadOnly { index: 0 })));
        assert_eq!(session.document().to_xml(), before);
        assert_eq!(session.views().print.text(), "1 2");
    }

    #[test]
    fn test_events_follow_edit() {
        let doc = blocks(2);
        let mut session = Session::new(doc, NullEngine, ViewConfig::default()).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        session.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        let outcome = session.remove_element(0).unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ViewEvent::Modified { nodes: outcome.modified });
        assert!(matches!(seen[1], ViewEvent::WindowChanged { .. }));
        assert_eq!(session.views().print.text(), "block0001a");
    }

    #[test]
    fn test_caret_at_edge_buffers_forward() {
        let mut session = Session::new(blocks(6), NullEngine, small()).unwrap();
        assert_eq!(session.window().loaded(), 0..3);
        // "block0002a" starts at 22 in "block0000a\nblock0001a\nblock0002a"
        session.caret_moved(View::Print, 24).unwrap();
        assert_eq!(session.window().loaded(), 1..4);
        let current = session.list().current_element().unwrap();
        assert_eq!(session.document().text_content(current.node.unwrap()), Some("block0002a"));
        let span = session.list().span(session.caret().unwrap()).unwrap();
        assert_eq!(session.views().print.caret_offset(), span.print.start + 2);
    }

    #[test]
    fn test_navigate_to_unloaded_node() {
        let mut session = Session::new(blocks(8), NullEngine, small()).unwrap();
        let doc = session.document();
        let root = doc.root_element_id().unwrap();
        let last_block = doc.children(root).last().unwrap();
        let target = doc.children(last_block).next().unwrap();

        assert!(session.navigate_to(target).unwrap());
        assert!(session.window().loaded().contains(&7));
        assert_eq!(session.list().current_element().unwrap().node, Some(target));
        assert!(!session.navigate_to(root).unwrap());
    }

    #[test]
    fn test_edit_far_from_start_keeps_caret() {
        let mut session = Session::new(blocks(8), NullEngine, small()).unwrap();
        let doc = session.document();
        let root = doc.root_element_id().unwrap();
        let block = doc.children(root).nth(6).unwrap();
        let target = doc.children(block).next().unwrap();
        session.navigate_to(target).unwrap();

        let index = session.list().index_of(target).unwrap();
        session.edit_text(index, "rewritten").unwrap();
        assert_eq!(session.list().current_element().unwrap().node, Some(target));
        assert!(session.views().print.text().contains("rewritten"));
    }
}
