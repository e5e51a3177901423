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

//! Path expression compiler
//!
//! Turns a query string into an ordered list of [`MatchStep`]s, expanding
//! property names through the context's [`NameExpander`]. Results are
//! memoized by exact query text.

pub mod cache;
pub mod grammar;
pub mod step;

pub use cache::{CacheStats, StepCache};
pub use step::{CompiledQuery, MatchStep, Predicate, is_literal_valued_key};

use crate::context::{Context, NameExpander};
use std::sync::Arc;

/// Compile a query without consulting any cache
pub fn compile(query: &str, expander: &NameExpander) -> CompiledQuery {
    let parts = grammar::split(query);
    CompiledQuery::new(query, grammar::assemble(&parts, expander))
}

/// Memoizing compiler bound to one context
#[derive(Debug, Default)]
pub struct StepCompiler {
    expander: NameExpander,
    cache: StepCache,
}

impl StepCompiler {
    /// Create a compiler for the given context
    pub fn new(context: &Context) -> Self {
        Self {
            expander: context.expander(),
            cache: StepCache::new(),
        }
    }

    /// The expander used for names and predicate values
    pub fn expander(&self) -> &NameExpander {
        &self.expander
    }

    /// Compile a query, reusing the cached steps for a known query string
    pub fn compile(&self, query: &str) -> Arc<CompiledQuery> {
        if let Some(compiled) = self.cache.get(query) {
            return compiled;
        }

        let compiled = compile(query, &self.expander);
        log::debug!(
            "Compiled query '{}' into {} step(s)",
            query,
            compiled.len()
        );
        self.cache.insert(query, Arc::new(compiled))
    }

    /// Statistics of the step cache
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of distinct queries compiled so far
    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }

    /// Reset the step cache
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
