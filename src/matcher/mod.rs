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

//! Step matcher
//!
//! Evaluates a compiled query against path traces. Steps are tried right to
//! left: the first step must match the traced node itself, later steps
//! float up the ancestor chain unless a `>` combinator pins them to the
//! adjacent ancestor. The synthetic root step is always pinned, so the
//! leftmost segment addresses a top-level member of the document.

pub mod predicate;

use crate::compiler::{CompiledQuery, MatchStep};
use crate::context::{NameExpander, keywords};
use crate::walker::{PathTrace, TraceEntry};
use serde_json::Value;
use std::sync::Arc;

/// Matches compiled queries against the traces of one document
#[derive(Debug, Clone, Copy)]
pub struct StepMatcher<'a> {
    document: &'a Value,
    expander: &'a NameExpander,
}

impl<'a> StepMatcher<'a> {
    /// Create a matcher for traces taken from `document`
    pub fn new(document: &'a Value, expander: &'a NameExpander) -> Self {
        Self { document, expander }
    }

    /// True when the compiled query selects the node `trace` was taken for
    pub fn matches(&self, compiled: &CompiledQuery, trace: &PathTrace) -> bool {
        if compiled.is_vacuous() || trace.is_empty() {
            return false;
        }
        let mut search = Search::new(compiled.steps(), trace.entries());
        self.assess(&mut search, 0, trace.len(), true)
    }

    /// Try the steps from `step` on against the entries below `bookmark`
    ///
    /// Non-pinned steps backtrack over every qualifying ancestor, nearest
    /// first. Whether a step is pinned follows from the step before it, so a
    /// `(step, bookmark)` pair that failed once fails every time.
    fn assess(
        &self,
        search: &mut Search<'_>,
        step: usize,
        bookmark: usize,
        pinned: bool,
    ) -> bool {
        let steps = search.steps;
        let entries = search.entries;
        let Some(current) = steps.get(step) else {
            return true;
        };

        if current.is_combinator() {
            return self.assess(search, step + 1, bookmark, true);
        }

        let Some(start) = bookmark.checked_sub(1) else {
            return false;
        };
        if search.has_failed(step, bookmark) {
            return false;
        }

        let found = if pinned || step + 1 == steps.len() {
            self.step_matches(current, &entries[start])
                && self.assess(search, step + 1, start, false)
        } else {
            (0..=start).rev().any(|position| {
                self.step_matches(current, &entries[position])
                    && self.assess(search, step + 1, position, false)
            })
        };

        if !found {
            search.mark_failed(step, bookmark);
        }
        found
    }

    /// Name test plus every predicate of `step`
    fn step_matches(&self, step: &MatchStep, entry: &TraceEntry) -> bool {
        let name_matches = step
            .name
            .as_deref()
            .is_none_or(|name| self.expander.matches(&entry.key, name));
        if !name_matches {
            return false;
        }

        if step.predicates.is_empty() {
            return true;
        }

        entry.value(self.document).is_some_and(|value| {
            step.predicates
                .iter()
                .all(|p| predicate::holds(p, value, self.expander))
        })
    }

    /// The value a matching trace selects
    ///
    /// A query ending in `@type` selects the type held by the containing node.
    pub fn resolve(&self, compiled: &CompiledQuery, trace: &PathTrace) -> Option<&'a Value> {
        if compiled.selects_type() {
            let parent_type = trace
                .parent()
                .and_then(|parent| parent.value(self.document))
                .and_then(|parent| parent.get(keywords::TYPE));
            if parent_type.is_some() {
                return parent_type;
            }
        }
        trace.node().and_then(|node| node.value(self.document))
    }

    /// The first selected value, in traversal order
    pub fn first_match(&self, compiled: &CompiledQuery, traces: &[PathTrace]) -> Option<&'a Value> {
        traces
            .iter()
            .filter(|trace| self.matches(compiled, trace))
            .find_map(|trace| self.resolve(compiled, trace))
    }

    /// Every selected value, in traversal order
    pub fn all_matches(&self, compiled: &CompiledQuery, traces: &[PathTrace]) -> Vec<&'a Value> {
        traces
            .iter()
            .filter(|trace| self.matches(compiled, trace))
            .filter_map(|trace| self.resolve(compiled, trace))
            .collect()
    }
}

/// Backtracking state for matching one trace
struct Search<'s> {
    steps: &'s [MatchStep],
    entries: &'s [Arc<TraceEntry>],
    /// `(step, bookmark)` pairs known not to match, row-major by step
    failed: Vec<bool>,
}

impl<'s> Search<'s> {
    fn new(steps: &'s [MatchStep], entries: &'s [Arc<TraceEntry>]) -> Self {
        Self {
            steps,
            entries,
            failed: vec![false; steps.len() * (entries.len() + 1)],
        }
    }

    fn slot(&self, step: usize, bookmark: usize) -> usize {
        step * (self.entries.len() + 1) + bookmark
    }

    fn has_failed(&self, step: usize, bookmark: usize) -> bool {
        self.failed[self.slot(step, bookmark)]
    }

    fn mark_failed(&mut self, step: usize, bookmark: usize) {
        let slot = self.slot(step, bookmark);
        self.failed[slot] = true;
    }
}

/// True when a selection should be returned raw instead of wrapped
///
/// That is the case for an empty selection, or when the query ends in one of
/// `@id`, `@index`, `@value` or `@type`.
pub fn is_final(compiled: &CompiledQuery, nothing_found: bool) -> bool {
    nothing_found || compiled.ends_in_value_keyword()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::context::Context;
    use crate::walker::trace;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn expander() -> NameExpander {
        Context::new().with_alias("ex", "http://x#").expander()
    }

    fn select_all(document: &Value, query: &str) -> Vec<Value> {
        let expander = expander();
        let compiled = compile(query, &expander);
        let traces = trace(document);
        StepMatcher::new(document, &expander)
            .all_matches(&compiled, &traces)
            .into_iter()
            .cloned()
            .collect()
    }

    fn select(document: &Value, query: &str) -> Option<Value> {
        let expander = expander();
        let compiled = compile(query, &expander);
        let traces = trace(document);
        StepMatcher::new(document, &expander)
            .first_match(&compiled, &traces)
            .cloned()
    }

    #[test]
    fn test_terminal_step_is_anchored() {
        let doc = json!({ "ex:name": "A" });
        assert_eq!(select(&doc, "ex:name"), Some(json!("A")));

        let nested = json!({ "ex:other": { "ex:name": "A" } });
        assert_eq!(select(&nested, "ex:other ex:name"), Some(json!("A")));
        assert_eq!(select(&nested, "ex:name"), None);
        assert_eq!(select(&nested, "ex:other"), Some(json!({ "ex:name": "A" })));
    }

    #[test]
    fn test_direct_child_versus_descendant() {
        let doc = json!({ "ex:a": { "ex:b": { "ex:c": 1 } } });
        assert_eq!(select(&doc, "ex:a > ex:c"), None);
        assert_eq!(select(&doc, "ex:a ex:c"), Some(json!(1)));
        assert_eq!(select(&doc, "ex:a > ex:b > ex:c"), Some(json!(1)));
        assert_eq!(select(&doc, "ex:a>ex:b"), Some(json!({ "ex:c": 1 })));
    }

    #[test]
    fn test_backtracks_over_ancestor_candidates() {
        let doc = json!({
            "ex:a": { "ex:b": { "ex:x": { "ex:b": { "ex:c": "deep" } } } }
        });
        // the nearest ex:b is not a direct child of ex:a, the outer one is
        assert_eq!(select(&doc, "ex:a > ex:b ex:c"), Some(json!("deep")));
    }

    #[test]
    fn test_predicate_filters_array_members() {
        let doc = json!({
            "ex:items": [
                { "ex:id": 1, "ex:flag": true },
                { "ex:id": 2, "ex:flag": false },
                { "ex:id": 3, "ex:flag": [true, false] }
            ]
        });

        let selected = select_all(&doc, "ex:items[ex:flag=true] ex:id");
        assert_eq!(selected, vec![json!(1), json!(3)]);
    }

    #[test]
    fn test_root_predicate() {
        let doc = json!({ "@type": "ex:Person", "ex:name": "A" });
        assert_eq!(select(&doc, "[@type=ex:Person]"), Some(doc.clone()));
        assert_eq!(select(&doc, "[@type=ex:Place]"), None);
    }

    #[test]
    fn test_root_predicate_constrains_descendants() {
        let doc = json!({ "@type": "ex:Person", "ex:name": "A" });
        assert_eq!(select(&doc, "[@type=ex:Person] > ex:name"), Some(json!("A")));
        assert_eq!(select(&doc, "[@type=ex:Place] ex:name"), None);
    }

    #[test]
    fn test_anchor_step_with_predicate() {
        let doc = json!({
            "ex:people": {
                "ex:list": [
                    { "@type": "ex:Person", "ex:name": "A" },
                    { "@type": "ex:Robot", "ex:name": "B" }
                ]
            }
        });
        assert_eq!(
            select_all(&doc, "ex:people *[@type=ex:Person] ex:name"),
            vec![json!("A")]
        );
    }

    #[test]
    fn test_type_selects_containing_node_type() {
        let doc = json!({ "ex:thing": { "@type": ["ex:A", "ex:B"], "ex:name": "n" } });
        assert_eq!(select(&doc, "ex:thing @type"), Some(json!(["ex:A", "ex:B"])));
    }

    #[test]
    fn test_value_keyword() {
        let doc = json!({ "ex:name": [{ "@value": "A", "@language": "en" }] });
        assert_eq!(select(&doc, "ex:name @value"), Some(json!("A")));
    }

    #[test]
    fn test_top_level_array_document() {
        let doc = json!([
            { "@id": "ex:a", "ex:name": "A" },
            { "@id": "ex:b", "ex:name": "B" }
        ]);
        assert_eq!(select_all(&doc, "ex:name"), vec![json!("A"), json!("B")]);
        assert_eq!(select(&doc, "[@id=ex:b] > ex:name"), Some(json!("B")));
    }

    #[test]
    fn test_trailing_combinator_pins_terminal_step() {
        let doc = json!({ "ex:a": { "ex:b": 1 } });
        assert_eq!(select(&doc, "ex:a >"), Some(json!({ "ex:b": 1 })));
    }

    #[test]
    fn test_degenerate_queries_do_not_match() {
        let doc = json!({ "ex:a": { "ex:b": 1 } });
        assert_eq!(select(&doc, "ex:a[broken"), None);
        assert_eq!(select(&doc, "ex:missing"), None);
        assert_eq!(select_all(&doc, "ex:a ex:missing"), Vec::<Value>::new());
    }

    #[test]
    fn test_empty_step_list_never_matches() {
        let doc = json!({ "ex:a": 1 });
        let expander = expander();
        let empty = CompiledQuery::new("", Vec::new());
        let traces = trace(&doc);
        let matcher = StepMatcher::new(&doc, &expander);
        assert!(traces.iter().all(|t| !matcher.matches(&empty, t)));
    }

    #[test]
    fn test_failing_query_on_deep_document_stays_polynomial() {
        let mut doc = json!({ "ex:leaf": 1 });
        for _ in 0..80 {
            doc = json!({ "ex:n": doc });
        }

        assert_eq!(select(&doc, "ex:z ex:n ex:n ex:n ex:n ex:n"), None);
        assert_eq!(
            select_all(&doc, "ex:n ex:n ex:z ex:n ex:n ex:leaf"),
            Vec::<Value>::new()
        );
        assert_eq!(select(&doc, "ex:n ex:n ex:n ex:n ex:n ex:leaf"), Some(json!(1)));
    }

    #[test]
    fn test_predicate_after_combinator_tests_the_child() {
        let doc = json!({ "ex:a": { "ex:b": { "ex:k": "no" } } });
        assert_eq!(select(&doc, "ex:a > [ex:k=yes]"), None);
        assert_eq!(select(&doc, "ex:a > [ex:k=no]"), Some(json!({ "ex:k": "no" })));
        assert_eq!(select(&doc, "ex:a > [ex:k=no] > ex:k"), Some(json!("no")));
    }

    #[test]
    fn test_vacuous_queries_match_nothing() {
        let doc = json!({ "ex:a": 1 });
        for query in ["", "   ", ">", "> >"] {
            assert_eq!(select(&doc, query), None, "{query:?}");
            assert_eq!(select_all(&doc, query), Vec::<Value>::new(), "{query:?}");
        }
    }

    #[test]
    fn test_is_final() {
        let expander = expander();
        assert!(is_final(&compile("ex:a", &expander), true));
        assert!(!is_final(&compile("ex:a", &expander), false));
        for query in ["ex:a @id", "ex:a @index", "ex:a @value", "@type"] {
            assert!(is_final(&compile(query, &expander), false), "{query}");
        }
        assert!(!is_final(&compile("ex:a @list", &expander), false));
    }
}
