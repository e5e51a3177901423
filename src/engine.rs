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

//! Query handles - the main entry point for querying documents
//!
//! [`LdQuery`] binds a context to documents; [`QueryNode`] is a handle on one
//! document that answers `query` and `query_all` and wraps non-final results
//! as further handles.

use crate::compiler::{CacheStats, CompiledQuery, StepCompiler};
use crate::config::CacheConfig;
use crate::context::Context;
use crate::matcher::{StepMatcher, is_final};
use crate::walker::{self, PathTrace};
use parking_lot::Mutex;
use serde_json::Value;
use std::ops::ControlFlow;
use std::sync::Arc;

/// Factory binding one context to any number of documents
///
/// All handles created by the same factory share its compiled-query cache.
#[derive(Debug, Clone)]
pub struct LdQuery {
    compiler: Arc<StepCompiler>,
    config: CacheConfig,
}

impl LdQuery {
    /// Create a factory for the given context
    pub fn new(context: &Context) -> Self {
        Self::with_config(context, CacheConfig::default())
    }

    /// Create a factory with custom cache settings
    pub fn with_config(context: &Context, config: CacheConfig) -> Self {
        Self {
            compiler: Arc::new(StepCompiler::new(context)),
            config,
        }
    }

    /// Bind a new handle to `document`
    pub fn document(&self, document: Value) -> QueryNode {
        QueryNode::new(
            Arc::new(document),
            Arc::clone(&self.compiler),
            self.config.trace_caching,
        )
    }

    /// Compile a query through the shared cache
    pub fn compile(&self, query: &str) -> Arc<CompiledQuery> {
        self.compiler.compile(query)
    }

    /// Statistics of the shared compiled-query cache
    pub fn cache_stats(&self) -> CacheStats {
        self.compiler.cache_stats()
    }
}

/// Create a factory for `context`
pub fn factory(context: &Context) -> LdQuery {
    LdQuery::new(context)
}

/// Bind a handle directly to `document` under `context`
pub fn build(document: Value, context: &Context) -> QueryNode {
    LdQuery::new(context).document(document)
}

/// Cache state shared by a handle and its clones
#[derive(Debug, Default)]
struct CacheState {
    caching: bool,
    traces: Option<Arc<Vec<PathTrace>>>,
}

/// Queryable handle on one document
///
/// Cloning a handle shares its cache state. Handles produced by `query` and
/// `query_all` inherit the caching flag but trace their own document.
#[derive(Debug, Clone)]
pub struct QueryNode {
    json: Arc<Value>,
    compiler: Arc<StepCompiler>,
    state: Arc<Mutex<CacheState>>,
}

impl QueryNode {
    fn new(json: Arc<Value>, compiler: Arc<StepCompiler>, caching: bool) -> Self {
        Self {
            json,
            compiler,
            state: Arc::new(Mutex::new(CacheState {
                caching,
                traces: None,
            })),
        }
    }

    /// The document this handle is bound to
    pub fn json(&self) -> &Value {
        &self.json
    }

    /// Take the bound document, cloning only if it is shared
    pub fn into_json(self) -> Value {
        Arc::try_unwrap(self.json).unwrap_or_else(|shared| (*shared).clone())
    }

    /// Whether traces of this document are kept between queries
    pub fn is_caching(&self) -> bool {
        self.state.lock().caching
    }

    /// Turn trace caching on or off
    ///
    /// Disabling drops any stored traces right away; enabling populates
    /// them lazily on the next query.
    pub fn with_caching(&self, enabled: bool) -> &Self {
        let mut state = self.state.lock();
        state.caching = enabled;
        if !enabled && state.traces.take().is_some() {
            log::debug!("Discarded cached traces");
        }
        self
    }

    /// Select the first match of `path`
    ///
    /// Returns `None` when nothing matches. A final selection (one ending in
    /// `@id`, `@index`, `@value` or `@type`, or a `null` value) comes back
    /// raw, anything else as a new handle.
    pub fn query(&self, path: &str) -> Option<Selection> {
        let compiled = self.compiler.compile(path);
        if compiled.is_vacuous() {
            return None;
        }

        let matcher = StepMatcher::new(&self.json, self.compiler.expander());
        let found = match self.cached_traces() {
            Some(traces) => matcher.first_match(&compiled, &traces),
            None => {
                let mut found = None;
                walker::walk(&self.json, |trace| {
                    if matcher.matches(&compiled, &trace) {
                        found = matcher.resolve(&compiled, &trace);
                        return ControlFlow::Break(());
                    }
                    ControlFlow::Continue(())
                });
                found
            }
        }?;

        log::trace!("Query '{path}' matched");
        if is_final(&compiled, found.is_null()) {
            Some(Selection::Value(found.clone()))
        } else {
            Some(Selection::Node(self.child(found.clone())))
        }
    }

    /// Select every match of `path`, in document order
    pub fn query_all(&self, path: &str) -> Selections {
        let compiled = self.compiler.compile(path);
        if compiled.is_vacuous() {
            return Selections::Values(Vec::new());
        }

        let matcher = StepMatcher::new(&self.json, self.compiler.expander());
        let traces = self
            .cached_traces()
            .unwrap_or_else(|| Arc::new(walker::trace(&self.json)));
        let found = matcher.all_matches(&compiled, &traces);

        log::trace!("Query '{}' matched {} node(s)", path, found.len());
        if is_final(&compiled, found.is_empty()) {
            Selections::Values(found.into_iter().cloned().collect())
        } else {
            Selections::Nodes(
                found
                    .into_iter()
                    .map(|value| self.child(value.clone()))
                    .collect(),
            )
        }
    }

    /// Traces of the bound document when caching is on, tracing on first use
    fn cached_traces(&self) -> Option<Arc<Vec<PathTrace>>> {
        let mut state = self.state.lock();
        if !state.caching {
            return None;
        }

        let traces = state.traces.get_or_insert_with(|| {
            let traces = walker::trace(&self.json);
            log::debug!("Cached {} trace(s) for document", traces.len());
            Arc::new(traces)
        });
        Some(Arc::clone(traces))
    }

    /// Wrap a selected value, inheriting the caching flag
    fn child(&self, json: Value) -> QueryNode {
        QueryNode::new(Arc::new(json), Arc::clone(&self.compiler), self.is_caching())
    }

    /// True when this handle currently holds cached traces
    pub fn has_cached_traces(&self) -> bool {
        self.state.lock().traces.is_some()
    }
}

/// Result of [`QueryNode::query`]
#[derive(Debug, Clone)]
pub enum Selection {
    /// A final, raw value
    Value(Value),
    /// A handle on the selected sub-document
    Node(QueryNode),
}

impl Selection {
    /// The selected JSON, whichever form it came in
    pub fn json(&self) -> &Value {
        match self {
            Selection::Value(value) => value,
            Selection::Node(node) => node.json(),
        }
    }

    /// Unwrap into the selected JSON
    pub fn into_json(self) -> Value {
        match self {
            Selection::Value(value) => value,
            Selection::Node(node) => node.into_json(),
        }
    }

    /// The raw value, if the selection was final
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Selection::Value(value) => Some(value),
            Selection::Node(_) => None,
        }
    }

    /// The handle, if the selection was wrapped
    pub fn as_node(&self) -> Option<&QueryNode> {
        match self {
            Selection::Value(_) => None,
            Selection::Node(node) => Some(node),
        }
    }
}

/// Result of [`QueryNode::query_all`]
#[derive(Debug, Clone)]
pub enum Selections {
    /// Final, raw values; also used for an empty result
    Values(Vec<Value>),
    /// Handles on the selected sub-documents
    Nodes(Vec<QueryNode>),
}

impl Selections {
    /// Number of selected items
    pub fn len(&self) -> usize {
        match self {
            Selections::Values(values) => values.len(),
            Selections::Nodes(nodes) => nodes.len(),
        }
    }

    /// True when nothing was selected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw values, if the selection was final
    pub fn values(&self) -> Option<&[Value]> {
        match self {
            Selections::Values(values) => Some(values),
            Selections::Nodes(_) => None,
        }
    }

    /// The handles, if the selection was wrapped
    pub fn nodes(&self) -> Option<&[QueryNode]> {
        match self {
            Selections::Values(_) => None,
            Selections::Nodes(nodes) => Some(nodes),
        }
    }

    /// Unwrap into the selected JSON values
    pub fn into_json(self) -> Vec<Value> {
        match self {
            Selections::Values(values) => values,
            Selections::Nodes(nodes) => nodes.into_iter().map(QueryNode::into_json).collect(),
        }
    }
}
