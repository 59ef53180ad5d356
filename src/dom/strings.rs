//! Name Interning Pool
//!
//! Element names, attribute names and namespace URIs repeat heavily in
//! transcription documents, so nodes store a `u32` id instead of a `String`.
//!
//! Storage is a single byte buffer plus `(offset, len)` entries; a hash index
//! maps content to ids (handles rare collisions).

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Interning pool for names and namespace URIs
///
/// Id 0 is reserved for the empty string ("no name" / "no namespace").
#[derive(Debug)]
pub struct StringPool {
    /// `(offset, len)` into `data`, indexed by string id
    entries: Vec<(u32, u32)>,
    /// Backing storage for every interned string
    data: String,
    /// Hash of string content -> list of ids with that hash
    hash_index: HashMap<u64, Vec<u32>>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(64),
            data: String::with_capacity(1024),
            hash_index: HashMap::new(),
        };
        pool.entries.push((0, 0));
        pool
    }

    #[inline]
    fn compute_hash(s: &str) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning its id
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        let hash = Self::compute_hash(s);
        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get_str(id) == Some(s) {
                    return id;
                }
            }
        }

        let offset = self.data.len() as u32;
        self.data.push_str(s);
        let id = self.entries.len() as u32;
        self.entries.push((offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(id);
        id
    }

    /// Look up an already-interned string without inserting it
    pub fn lookup(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        let ids = self.hash_index.get(&Self::compute_hash(s))?;
        ids.iter().copied().find(|&id| self.get_str(id) == Some(s))
    }

    /// Get a string by id
    pub fn get_str(&self, id: u32) -> Option<&str> {
        let &(offset, len) = self.entries.get(id as usize)?;
        let start = offset as usize;
        self.data.get(start..start + len as usize)
    }

    /// Number of unique strings stored (including the reserved empty entry)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the pool holds nothing but the reserved entry
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }
}
