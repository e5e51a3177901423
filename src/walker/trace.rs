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

//! Path trace data model

use crate::context::keywords;
use serde_json::Value;
use std::sync::Arc;

/// Shape of a visited value, decided once per value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// JSON object; stays on the trace while its members are visited
    Object,
    /// JSON array; only groups its elements and never becomes an entry
    Array,
    /// Scalar, `null`, or a `@type` list
    Leaf,
}

impl NodeKind {
    /// Classify `value` found under `key`
    ///
    /// A `@type` array is a value, not a sub-document, so it is a leaf.
    pub fn of(key: &str, value: &Value) -> Self {
        match value {
            Value::Array(_) if key == keywords::TYPE => NodeKind::Leaf,
            Value::Array(_) => NodeKind::Array,
            Value::Object(_) => NodeKind::Object,
            _ => NodeKind::Leaf,
        }
    }
}

/// One node visited during traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Visit sequence number; the root is 0
    pub id: usize,
    /// Shape of the node's value
    pub kind: NodeKind,
    /// Property name the node was reached through; array elements carry the
    /// name of the property holding the array
    pub key: Arc<str>,
    /// Position within the enclosing array, if any
    pub index: Option<usize>,
    /// JSON pointer of the value inside the traced document
    pointer: String,
}

impl TraceEntry {
    pub(crate) fn new(
        id: usize,
        kind: NodeKind,
        key: Arc<str>,
        index: Option<usize>,
        pointer: String,
    ) -> Self {
        Self {
            id,
            kind,
            key,
            index,
            pointer,
        }
    }

    /// JSON pointer of this node relative to the traced document
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// Resolve this node's value inside `document`
    pub fn value<'d>(&self, document: &'d Value) -> Option<&'d Value> {
        document.pointer(&self.pointer)
    }
}

/// Ancestor chain of one node, root first and the node itself last
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathTrace {
    entries: Vec<Arc<TraceEntry>>,
}

impl PathTrace {
    pub(crate) fn new(entries: Vec<Arc<TraceEntry>>) -> Self {
        Self { entries }
    }

    /// All entries, root first
    pub fn entries(&self) -> &[Arc<TraceEntry>] {
        &self.entries
    }

    /// Entry at `position`
    pub fn get(&self, position: usize) -> Option<&TraceEntry> {
        self.entries.get(position).map(Arc::as_ref)
    }

    /// Number of entries including the root
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for a trace without entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The node this trace was captured for
    pub fn node(&self) -> Option<&TraceEntry> {
        self.entries.last().map(Arc::as_ref)
    }

    /// The entry directly above the node
    pub fn parent(&self) -> Option<&TraceEntry> {
        self.entries
            .len()
            .checked_sub(2)
            .and_then(|position| self.get(position))
    }
}

/// Escape a reference token for use in a JSON pointer
pub(crate) fn escape_pointer_token(token: &str) -> std::borrow::Cow<'_, str> {
    if token.contains(['~', '/']) {
        std::borrow::Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        std::borrow::Cow::Borrowed(token)
    }
}
