//! Recent search hits
//!
//! Sections are rebuilt after every edit, so a remembered hit is only a
//! guess: it is checked against the current sections before use and
//! forgotten if it no longer holds.

use std::num::NonZeroUsize;

use lru::LruCache;

use super::SearchHit;
use crate::dom::NodeId;
use crate::map::Section;

#[derive(Debug)]
pub struct SearchCache {
    hits: LruCache<NodeId, SearchHit>,
}

impl SearchCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        SearchCache {
            hits: LruCache::new(capacity),
        }
    }

    /// A remembered hit for `node` that still holds in `sections`
    pub fn lookup(&mut self, node: NodeId, sections: &[Section]) -> Option<SearchHit> {
        let hit = *self.hits.get(&node)?;
        let valid = sections.get(hit.section).is_some_and(|section| {
            !section.in_view
                && section
                    .elements
                    .get(hit.element)
                    .is_some_and(|e| e.node == Some(node))
        });
        if valid {
            Some(hit)
        } else {
            self.hits.pop(&node);
            None
        }
    }

    pub fn remember(&mut self, node: NodeId, hit: SearchHit) {
        self.hits.put(node, hit);
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
