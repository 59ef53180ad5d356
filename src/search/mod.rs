//! Parallel section search
//!
//! Finds the section and element index of a node that lies outside the
//! current window. The non-visible sections are split into contiguous
//! chunks of `max(count / processors, 1)` sections, one rayon task per
//! chunk on a pool built for the call. The first match stops the rest.
//!
//! A chunk that fails (a probe error or a panic) is counted. If no chunk
//! finds the node and any chunk failed, the search reports
//! [`SearchError::ChunksFailed`]: a failed search is never reported as "not
//! found".

pub mod cache;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::ViewConfig;
use crate::dom::NodeId;
use crate::error::{SearchError, SectionFault};
use crate::map::Section;

pub use cache::SearchCache;

/// Where a node was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchHit {
    pub section: usize,
    /// Index within the section's elements
    pub element: usize,
}

/// Split the indices of non-visible sections into contiguous chunks
pub fn partition(sections: &[Section], processors: usize) -> Vec<Vec<usize>> {
    let candidates: Vec<usize> = (0..sections.len()).filter(|&i| !sections[i].in_view).collect();
    if candidates.is_empty() {
        return Vec::new();
    }
    let size = (candidates.len() / processors.max(1)).max(1);
    candidates.chunks(size).map(<[usize]>::to_vec).collect()
}

#[derive(Debug)]
pub struct SectionMapSearcher {
    processors: usize,
    cache: SearchCache,
}

impl SectionMapSearcher {
    pub fn new(config: &ViewConfig) -> Self {
        SectionMapSearcher {
            processors: config.search_processors().max(1),
            cache: SearchCache::new(config.search_cache_capacity),
        }
    }

    pub fn processors(&self) -> usize {
        self.processors
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Forget every remembered hit
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Locate `node` among the non-visible sections
    pub fn search(&mut self, sections: &[Section], node: NodeId) -> Result<Option<SearchHit>, SearchError> {
        if let Some(hit) = self.cache.lookup(node, sections) {
            debug!(node, section = hit.section, "search served from cache");
            return Ok(Some(hit));
        }
        let found = self.search_with(sections, |_, section| Ok(section.index_of(node)))?;
        if let Some(hit) = found {
            self.cache.remember(node, hit);
        }
        Ok(found)
    }

    /// Run `probe` over every non-visible section in parallel; the first
    /// `Some(element)` wins
    pub fn search_with<F>(&self, sections: &[Section], probe: F) -> Result<Option<SearchHit>, SearchError>
    where
        F: Fn(usize, &Section) -> Result<Option<usize>, SectionFault> + Sync,
    {
        let chunks = partition(sections, self.processors);
        if chunks.is_empty() {
            return Ok(None);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.processors)
            .build()?;
        let stop = AtomicBool::new(false);
        let failed = AtomicUsize::new(0);

        let found = pool.install(|| {
            chunks.par_iter().find_map_any(|chunk| {
                let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<Option<SearchHit>, SectionFault> {
                    for &index in chunk {
                        if stop.load(Ordering::Relaxed) {
                            return Ok(None);
                        }
                        if let Some(element) = probe(index, &sections[index])? {
                            return Ok(Some(SearchHit {
                                section: index,
                                element,
                            }));
                        }
                    }
                    Ok(None)
                }));
                match outcome {
                    Ok(Ok(Some(hit))) => {
                        stop.store(true, Ordering::Relaxed);
                        Some(hit)
                    }
                    Ok(Ok(None)) => None,
                    Ok(Err(fault)) => {
                        warn!(section = fault.section, reason = %fault.reason, "search chunk failed");
                        failed.fetch_add(1, Ordering::Relaxed);
                        None
                    }
                    Err(_) => {
                        warn!(first = chunk.first().copied(), "search chunk panicked");
                        failed.fetch_add(1, Ordering::Relaxed);
                        None
                    }
                }
            })
        });

        let failed = failed.into_inner();
        debug!(
            chunks = chunks.len(),
            processors = self.processors,
            failed,
            found = found.is_some(),
            "section search finished"
        );
        match found {
            Some(hit) => Ok(Some(hit)),
            None if failed > 0 => {
                warn!(failed, total = chunks.len(), "section search failed");
                Err(SearchError::ChunksFailed {
                    failed,
                    total: chunks.len(),
                })
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MappedElement;
    use tracing_test::traced_test;

    /// `count` sections of two elements each; section `i` holds nodes
    /// `10 * i` and `10 * i + 1`
    fn sections(count: usize) -> Vec<Section> {
        (0..count)
            .map(|i| {
                let mut section = Section::new();
                let base = (10 * i) as NodeId;
                section.push(MappedElement::text(base, None), 1);
                section.push(MappedElement::text(base + 1, None), 1);
                section
            })
            .collect()
    }

    fn searcher(threads: usize) -> SectionMapSearcher {
        SectionMapSearcher::new(&ViewConfig::default().with_search_threads(threads))
    }

    #[test]
    fn test_partition_sizes() {
        let all = sections(10);
        let chunks = partition(&all, 4);
        // 10 / 4 = 2 per chunk
        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.len() == 2));
        assert_eq!(chunks.concat(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_degenerate_partition() {
        let all = sections(3);
        let chunks = partition(&all, 8);
        assert_eq!(chunks, vec![vec![0], vec![1], vec![2]]);
        assert!(partition(&[], 8).is_empty());
    }

    #[test]
    fn test_partition_skips_visible() {
        let mut all = sections(4);
        all[1].in_view = true;
        all[2].in_view = true;
        assert_eq!(partition(&all, 1), vec![vec![0, 3]]);
    }

    #[test]
    fn test_finds_node() {
        let mut searcher = searcher(4);
        let all = sections(12);
        assert_eq!(
            searcher.search(&all, 71).unwrap(),
            Some(SearchHit { section: 7, element: 1 })
        );
        assert_eq!(searcher.search(&all, 5).unwrap(), None);
        assert_eq!(searcher.cache().len(), 1);
    }

    #[test]
    fn test_visible_sections_not_searched() {
        let mut searcher = searcher(2);
        let mut all = sections(3);
        all[1].in_view = true;
        assert_eq!(searcher.search(&all, 10).unwrap(), None);
    }

    #[traced_test]
    #[test]
    fn test_failures_surface_when_not_found() {
        let searcher = searcher(2);
        let all = sections(4);
        let err = searcher
            .search_with(&all, |index, _| {
                Err(SectionFault {
                    section: index,
                    reason: "unreadable".into(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, SearchError::ChunksFailed { failed: 2, total: 2 }));
        assert!(logs_contain("section search failed"));
    }

    #[test]
    fn test_panics_are_counted() {
        let searcher = searcher(3);
        let all = sections(3);
        let err = searcher
            .search_with(&all, |index, _| -> Result<Option<usize>, SectionFault> {
                if index == 1 {
                    panic!("probe blew up");
                }
                Ok(None)
            })
            .unwrap_err();
        assert!(matches!(err, SearchError::ChunksFailed { failed: 1, total: 3 }));
    }

    #[test]
    fn test_match_wins_over_failures() {
        let searcher = searcher(3);
        let all = sections(3);
        let hit = searcher
            .search_with(&all, |index, section| {
                if index == 0 {
                    return Err(SectionFault {
                        section: index,
                        reason: "bad".into(),
                    });
                }
                Ok(section.index_of(21))
            })
            .unwrap();
        assert_eq!(hit, Some(SearchHit { section: 2, element: 1 }));
    }
}
