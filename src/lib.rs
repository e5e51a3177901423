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

//! Selector-style queries over linked-data JSON documents
//!
//! Queries such as `so:author so:name @value` are compiled into match steps,
//! with short names expanded through a JSON-LD style context, and evaluated
//! against the ancestor chains of every node in a document.
//!
//! ```rust
//! use ld_query::{Context, build};
//! use serde_json::json;
//!
//! let context = Context::new().with_alias("ex", "http://example.com/ns#");
//! let doc = build(json!({ "ex:author": { "ex:name": "Ada" } }), &context);
//!
//! let name = doc.query("ex:author ex:name").map(|s| s.into_json());
//! assert_eq!(name, Some(json!("Ada")));
//! ```

pub mod compiler;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod walker;

// Re-export main types
pub use compiler::{CacheStats, CompiledQuery, MatchStep, Predicate, StepCompiler};
pub use config::CacheConfig;
pub use context::{Context, NameExpander, keywords};
pub use engine::{LdQuery, QueryNode, Selection, Selections, build, factory};
pub use error::{LdQueryError, Result};
pub use matcher::StepMatcher;
pub use walker::{NodeKind, PathTrace, TraceEntry};
