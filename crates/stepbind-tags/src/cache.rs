//! Write-once cache of compiled tag filters
//!
//! The same filter is evaluated once per scenario, and a run usually reuses
//! one expression across many features. Entries are keyed by the literal
//! expression string and never replaced once stored.

use crate::error::TagFilterError;
use crate::expr::TagFilter;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

static GLOBAL: Lazy<TagFilterCache> = Lazy::new(TagFilterCache::new);

/// Cache of compiled filters
///
/// Build one per session or per test for isolation, or share the
/// process-wide instance from [`TagFilterCache::global`].
#[derive(Debug, Default)]
pub struct TagFilterCache {
    filters: DashMap<String, Arc<TagFilter>>,
}

impl TagFilterCache {
    /// Create empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: DashMap::new(),
        }
    }

    /// Process-wide cache
    #[inline]
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Get a compiled filter, compiling and storing it on first use
    ///
    /// # Errors
    /// Returns the compile error; failed expressions are not cached
    pub fn get_or_compile(&self, expression: &str) -> Result<Arc<TagFilter>, TagFilterError> {
        self.get_or_compile_with(expression, TagFilter::compile)
    }

    /// Get a compiled filter, calling `compile` only on a cache miss
    ///
    /// # Errors
    /// Returns whatever `compile` returned on a miss
    pub fn get_or_compile_with<F>(
        &self,
        expression: &str,
        compile: F,
    ) -> Result<Arc<TagFilter>, TagFilterError>
    where
        F: FnOnce(&str) -> Result<TagFilter, TagFilterError>,
    {
        if let Some(hit) = self.get(expression) {
            return Ok(hit);
        }

        match self.filters.entry(expression.to_string()) {
            Entry::Occupied(existing) => Ok(Arc::clone(existing.get())),
            Entry::Vacant(slot) => {
                let filter = Arc::new(compile(expression)?);
                tracing::debug!(expression, "cached tag filter");
                slot.insert(Arc::clone(&filter));
                Ok(filter)
            }
        }
    }

    /// Look up an already compiled filter
    #[inline]
    #[must_use]
    pub fn get(&self, expression: &str) -> Option<Arc<TagFilter>> {
        self.filters.get(expression).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if expression is cached
    #[inline]
    #[must_use]
    pub fn contains(&self, expression: &str) -> bool {
        self.filters.contains_key(expression)
    }

    /// Number of cached filters
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if cache is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
