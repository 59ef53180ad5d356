//! View configuration
//!
//! Passed into constructors; nothing in the crate reads process-wide
//! settings. Persisting it is up to the embedding application (the type is
//! serde-serializable).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Print chars after which the Initializer starts a new section
    pub section_threshold: usize,
    /// Print chars the window tries to stay under
    pub window_budget: usize,
    /// Search pool size; `None` uses the available parallelism
    pub search_threads: Option<usize>,
    /// Number of recent search hits remembered
    pub search_cache_capacity: usize,
    /// Tab stop spacing for tabs without an explicit column
    pub default_tab_width: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            section_threshold: 10_000,
            window_budget: 20_000,
            search_threads: None,
            search_cache_capacity: 64,
            default_tab_width: 8,
        }
    }
}

impl ViewConfig {
    pub fn with_section_threshold(mut self, chars: usize) -> Self {
        self.section_threshold = chars;
        self
    }

    pub fn with_window_budget(mut self, chars: usize) -> Self {
        self.window_budget = chars;
        self
    }

    pub fn with_search_threads(mut self, threads: usize) -> Self {
        self.search_threads = Some(threads);
        self
    }

    pub fn with_search_cache_capacity(mut self, capacity: usize) -> Self {
        self.search_cache_capacity = capacity;
        self
    }

    pub fn with_default_tab_width(mut self, width: usize) -> Self {
        self.default_tab_width = width;
        self
    }

    /// Reject values that would stall partitioning or windowing
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.section_threshold == 0 {
            return Err(ConfigError::Zero("section_threshold"));
        }
        if self.window_budget == 0 {
            return Err(ConfigError::Zero("window_budget"));
        }
        if self.search_threads == Some(0) {
            return Err(ConfigError::Zero("search_threads"));
        }
        if self.search_cache_capacity == 0 {
            return Err(ConfigError::Zero("search_cache_capacity"));
        }
        if self.default_tab_width == 0 {
            return Err(ConfigError::Zero("default_tab_width"));
        }
        Ok(())
    }

    /// Worker count for the section search
    pub fn search_processors(&self) -> usize {
        self.search_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
