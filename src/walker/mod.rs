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

//! Document walker
//!
//! Linearizes a document into path traces with a single iterative
//! depth-first traversal. Frames live on an explicit stack so deeply nested
//! documents never hit the native recursion limit.

mod trace;

pub use trace::{NodeKind, PathTrace, TraceEntry};

use crate::context::keywords;
use serde_json::Value;
use std::ops::ControlFlow;
use std::sync::Arc;
use trace::escape_pointer_token;

/// How a child is addressed inside its container
#[derive(Debug, Clone, Copy)]
enum Child<'d> {
    Key(&'d str),
    Index(usize),
}

/// Pending work for one container on the walk stack
#[derive(Debug)]
struct Frame<'d> {
    kind: NodeKind,
    key: Arc<str>,
    pointer: String,
    /// Remaining children, next child last
    items: Vec<(Child<'d>, &'d Value)>,
}

impl<'d> Frame<'d> {
    fn new(kind: NodeKind, key: Arc<str>, pointer: String, value: &'d Value) -> Self {
        let items = match (kind, value) {
            (NodeKind::Object, Value::Object(map)) => map
                .iter()
                .rev()
                .map(|(k, v)| (Child::Key(k.as_str()), v))
                .collect(),
            (NodeKind::Array, Value::Array(items)) => items
                .iter()
                .enumerate()
                .rev()
                .map(|(i, v)| (Child::Index(i), v))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            kind,
            key,
            pointer,
            items,
        }
    }

    /// Key, array index and pointer of a child of this frame
    ///
    /// Array elements inherit the key of the property holding the array.
    fn locate(&self, child: Child<'_>) -> (Arc<str>, Option<usize>, String) {
        match child {
            Child::Key(key) => (
                Arc::from(key),
                None,
                format!("{}/{}", self.pointer, escape_pointer_token(key)),
            ),
            Child::Index(index) => (
                Arc::clone(&self.key),
                Some(index),
                format!("{}/{}", self.pointer, index),
            ),
        }
    }
}

/// Walk `document`, handing every visited node's trace to `visit`
///
/// The root is visited first as a one-entry trace. Each snapshot is an owned
/// copy of the ancestor chain at visit time. Returning `ControlFlow::Break`
/// stops the walk early.
pub fn walk<F>(document: &Value, mut visit: F)
where
    F: FnMut(PathTrace) -> ControlFlow<()>,
{
    let root_key: Arc<str> = Arc::from(keywords::DOCUMENT);
    let root_kind = NodeKind::of(keywords::DOCUMENT, document);
    let mut next_id = 0;

    let mut path = vec![Arc::new(TraceEntry::new(
        next_id,
        root_kind,
        Arc::clone(&root_key),
        None,
        String::new(),
    ))];
    if visit(PathTrace::new(path.clone())).is_break() {
        return;
    }

    let mut stack = vec![Frame::new(root_kind, root_key, String::new(), document)];

    while let Some(frame) = stack.last_mut() {
        let Some((child, value)) = frame.items.pop() else {
            if frame.kind != NodeKind::Array {
                path.pop();
            }
            stack.pop();
            continue;
        };

        let (key, index, pointer) = frame.locate(child);
        let kind = NodeKind::of(&key, value);

        if kind == NodeKind::Array {
            stack.push(Frame::new(kind, key, pointer, value));
            continue;
        }

        next_id += 1;
        path.push(Arc::new(TraceEntry::new(
            next_id,
            kind,
            Arc::clone(&key),
            index,
            pointer.clone(),
        )));

        if visit(PathTrace::new(path.clone())).is_break() {
            return;
        }

        if kind == NodeKind::Leaf {
            path.pop();
        } else {
            stack.push(Frame::new(kind, key, pointer, value));
        }
    }
}

/// Collect the trace of every node in `document`, in visit order
pub fn trace(document: &Value) -> Vec<PathTrace> {
    let mut traces = Vec::new();
    walk(document, |snapshot| {
        traces.push(snapshot);
        ControlFlow::Continue(())
    });
    log::trace!("Traced document into {} path(s)", traces.len());
    traces
}
