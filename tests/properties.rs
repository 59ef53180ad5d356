//! Property tests for the mapping, windowing and search invariants
//!
//! Documents are generated as runs of blocks with random text, spacing,
//! indentation, inline spans and generated braille, then checked for:
//!
//! - round trip: every print text node maps back to itself
//! - coverage: element and marker lengths add up to the print view
//! - monotonicity: mapped elements follow document order
//! - windowing bound: budget plus at most one section, except where the
//!   caret's section and its neighbours alone are larger
//! - search correctness and degenerate partitioning

use std::cmp::Ordering;

use dualview::dom::axes;
use dualview::search::partition;
use dualview::view::Direction;
use dualview::{
    vocab, Document, DocumentAccess, DualView, Initializer, MapList, SearchHit, Section, SectionMapSearcher,
    ViewBuffer, ViewConfig, ViewInitializer,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Block {
    text: String,
    inline: Option<String>,
    braille: bool,
    lines_before: usize,
    lines_after: usize,
    indent: usize,
}

fn arb_block() -> impl Strategy<Value = Block> {
    (
        "[a-z][a-z ]{0,15}",
        prop::option::of("[a-z]{1,6}"),
        any::<bool>(),
        0usize..3,
        0usize..3,
        0usize..4,
    )
        .prop_map(|(text, inline, braille, lines_before, lines_after, indent)| Block {
            text,
            inline,
            braille,
            lines_before,
            lines_after,
            indent,
        })
}

fn to_xml(blocks: &[Block]) -> String {
    let mut xml = String::from(r#"<book xmlns:utd="urn:dualview:braille">"#);
    for block in blocks {
        xml.push_str(&format!(
            r#"<p type="block" linesBefore="{}" linesAfter="{}" indent="{}">{}"#,
            block.lines_before, block.lines_after, block.indent, block.text
        ));
        if block.braille {
            xml.push_str(&format!("<utd:brl>{}</utd:brl>", block.text.to_uppercase()));
        }
        if let Some(inline) = &block.inline {
            xml.push_str(&format!(r#"<span type="inline">{inline}</span>"#));
        }
        xml.push_str("</p>");
    }
    xml.push_str("</book>");
    xml
}

struct Fixture {
    doc: Document,
    window: ViewInitializer,
    list: MapList,
    views: DualView,
    config: ViewConfig,
}

fn fixture(blocks: &[Block], threshold: usize, budget: usize) -> Fixture {
    let doc = Document::parse(&to_xml(blocks)).unwrap();
    let config = ViewConfig::default()
        .with_section_threshold(threshold)
        .with_window_budget(budget);
    let root = doc.root_element_id().unwrap();
    let sections = Initializer::new(&config).build(&doc, root).unwrap();
    let mut window = ViewInitializer::new(sections, &config);
    let mut list = MapList::new();
    let mut views = DualView::in_memory();
    window.initialize(&doc, &mut list, &mut views).unwrap();
    Fixture {
        doc,
        window,
        list,
        views,
        config,
    }
}

/// Print text nodes (braille excluded) in document order
fn print_text_nodes(doc: &Document) -> Vec<u32> {
    let root = doc.root_element_id().unwrap();
    doc.descendants(root)
        .filter(|&id| doc.is_text(id))
        .filter(|&id| axes::find_ancestor(doc, id, |d, a| vocab::is_braille(d, a)).is_none())
        .collect()
}

fn check_coverage(f: &Fixture) -> Result<(), TestCaseError> {
    let total: usize = f
        .list
        .iter()
        .map(|e| e.print_len(&f.doc))
        .sum();
    prop_assert_eq!(total, f.views.print.char_count());
    prop_assert_eq!(f.list.print_len().unwrap(), f.views.print.char_count());
    Ok(())
}

fn check_monotonic(f: &Fixture) -> Result<(), TestCaseError> {
    let nodes: Vec<u32> = f.list.iter().filter_map(|e| e.node).collect();
    for pair in nodes.windows(2) {
        prop_assert_ne!(axes::compare_document_order(&f.doc, pair[0], pair[1]), Ordering::Greater);
    }
    Ok(())
}

fn check_bound(f: &Fixture) -> Result<(), TestCaseError> {
    let largest = f.window.sections().iter().map(|s| s.chars).max().unwrap_or(0);
    if f.window.loaded_chars() <= f.config.window_budget + largest {
        return Ok(());
    }
    // over budget only while an edge of the window is pinned next to the caret
    let loaded = f.window.loaded();
    let caret = f.list.current_element().unwrap().section;
    prop_assert!(
        loaded.len() <= 3 || loaded.start + 1 >= caret || caret + 2 >= loaded.end,
        "window {:?} over budget with caret in section {}",
        loaded,
        caret
    );
    Ok(())
}

#[derive(Debug, Clone)]
enum WindowOp {
    Forward,
    Backward,
    Reset(usize),
}

fn arb_window_op() -> impl Strategy<Value = WindowOp> {
    prop_oneof![
        Just(WindowOp::Forward),
        Just(WindowOp::Backward),
        (0usize..64).prop_map(WindowOp::Reset),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_print_node_maps_back_to_itself(blocks in prop::collection::vec(arb_block(), 1..12)) {
        let f = fixture(&blocks, 10_000, 1_000_000);
        for node in print_text_nodes(&f.doc) {
            let index = f.list.index_of(node).unwrap();
            prop_assert_eq!(f.list.elements()[index].node, Some(node));
        }
    }

    #[test]
    fn windows_cover_the_print_view_in_order(
        blocks in prop::collection::vec(arb_block(), 1..24),
        threshold in 5usize..40,
        budget in 10usize..120,
        ops in prop::collection::vec(arb_window_op(), 0..12),
    ) {
        let mut f = fixture(&blocks, threshold, budget);
        check_coverage(&f)?;
        check_monotonic(&f)?;
        check_bound(&f)?;

        for op in ops {
            let loaded = f.window.loaded();
            let count = f.window.section_count();
            let result = match op {
                WindowOp::Forward if loaded.end < count => f.window.buffer_views(
                    &f.doc, &mut f.list, &mut f.views, loaded.end, Direction::Forward,
                ),
                WindowOp::Backward if loaded.start > 0 => f.window.buffer_views(
                    &f.doc, &mut f.list, &mut f.views, loaded.start - 1, Direction::Backward,
                ),
                WindowOp::Reset(index) => f.window.reset_views(&f.doc, &mut f.list, &mut f.views, index % count),
                _ => continue,
            };
            prop_assert!(result.is_ok());
            check_coverage(&f)?;
            check_monotonic(&f)?;
            check_bound(&f)?;

            // every content element is either live or parked in its section
            let parked: usize = f.window.sections().iter().map(Section::len).sum();
            let live = f.list.iter().filter(|e| !e.is_white_space()).count();
            prop_assert_eq!(parked + live, print_text_nodes(&f.doc).len());
        }
    }

    #[test]
    fn search_finds_exactly_the_hidden_nodes(
        blocks in prop::collection::vec(arb_block(), 1..24),
        threshold in 5usize..30,
        visible in prop::collection::vec(any::<bool>(), 24),
        threads in 1usize..6,
    ) {
        let doc = Document::parse(&to_xml(&blocks)).unwrap();
        let config = ViewConfig::default()
            .with_section_threshold(threshold)
            .with_search_threads(threads);
        let root = doc.root_element_id().unwrap();
        let mut sections = Initializer::new(&config).build(&doc, root).unwrap();
        for (section, &shown) in sections.iter_mut().zip(&visible) {
            section.in_view = shown;
        }
        let mut searcher = SectionMapSearcher::new(&config);

        for (index, section) in sections.iter().enumerate() {
            for (element, mapped) in section.elements.iter().enumerate() {
                let Some(node) = mapped.node else { continue };
                let found = searcher.search(&sections, node).unwrap();
                if section.in_view {
                    prop_assert_eq!(found, None);
                } else {
                    prop_assert_eq!(found, Some(SearchHit { section: index, element }));
                }
            }
        }
    }

    #[test]
    fn partition_never_yields_empty_chunks(count in 0usize..40, processors in 1usize..16) {
        let sections = vec![Section::new(); count];
        let chunks = partition(&sections, processors);
        prop_assert!(chunks.iter().all(|c| !c.is_empty()));
        prop_assert_eq!(chunks.concat(), (0..count).collect::<Vec<_>>());
        if count < processors {
            prop_assert_eq!(chunks.len(), count);
        }
    }
}
