// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compiled-query cache
//!
//! Append-only map from the literal query string to its compiled steps. One
//! cache lives for as long as the compiler that owns it.

use super::step::CompiledQuery;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Basic cache statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit ratio as percentage
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hits: {}, misses: {}, hit ratio: {:.1}%",
            self.hits,
            self.misses,
            self.hit_ratio()
        )
    }
}

/// Thread-safe, append-only store of compiled queries
#[derive(Debug, Default)]
pub struct StepCache {
    entries: DashMap<String, Arc<CompiledQuery>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StepCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a query, recording a hit or a miss
    pub fn get(&self, query: &str) -> Option<Arc<CompiledQuery>> {
        match self.entries.get(query) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a compiled query, keeping any entry that won a race
    pub fn insert(&self, query: &str, compiled: Arc<CompiledQuery>) -> Arc<CompiledQuery> {
        Arc::clone(
            self.entries
                .entry(query.to_string())
                .or_insert(compiled)
                .value(),
        )
    }

    /// Number of cached queries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current hit/miss counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop all entries and reset statistics (useful for testing)
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::step::MatchStep;

    fn compiled(source: &str) -> Arc<CompiledQuery> {
        Arc::new(CompiledQuery::new(source, vec![MatchStep::root()]))
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = StepCache::new();
        assert!(cache.get("ex:a").is_none());

        cache.insert("ex:a", compiled("ex:a"));
        assert!(cache.get("ex:a").is_some());

        let stats = cache.stats();
        assert_eq!(stats, CacheStats { hits: 1, misses: 1 });
        assert_eq!(stats.hit_ratio(), 50.0);
        assert_eq!(stats.to_string(), "hits: 1, misses: 1, hit ratio: 50.0%");
    }

    #[test]
    fn test_insert_keeps_first_entry() {
        let cache = StepCache::new();
        let first = cache.insert("ex:a", compiled("ex:a"));
        let second = cache.insert("ex:a", compiled("ex:a"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let cache = StepCache::new();
        cache.insert("ex:a", compiled("ex:a"));
        cache.get("ex:a");
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
