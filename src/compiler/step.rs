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

//! Compiled match steps

use crate::context::{NameExpander, keywords};
use serde::Serialize;
use smallvec::SmallVec;

/// Attribute test `[key=value]` attached to a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    /// Expanded property name looked up on the candidate node
    pub key: String,
    /// Expected value, expanded unless the key is literal-valued
    pub expected: String,
    /// Whether `expected` went through name expansion
    pub expanded: bool,
}

impl Predicate {
    /// Compile a predicate from its raw key and value text
    pub fn compile(key: &str, value: &str, expander: &NameExpander) -> Self {
        let expanded = !is_literal_valued_key(key);
        let expected = if expanded {
            expander.expand(value).into_owned()
        } else {
            value.to_string()
        };

        Self {
            key: expander.expand(key).into_owned(),
            expected,
            expanded,
        }
    }
}

/// True when values under `key` are compared verbatim
///
/// Any structural keyword other than `@id` and `@type` (`@index`, `@value`,
/// `@list`, ...) holds literal data rather than IRIs.
pub fn is_literal_valued_key(key: &str) -> bool {
    key.match_indices('@').any(|(at, _)| {
        let rest = &key[at + 1..];
        !(rest.starts_with("type") || rest.starts_with("id"))
    })
}

/// One compiled unit of a path expression
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchStep {
    /// Expanded name to test, `None` matches any node
    pub name: Option<String>,
    /// Combinator marker: the following step must match the adjacent ancestor
    pub direct_child: bool,
    /// Attribute predicates, all of which must hold
    pub predicates: SmallVec<[Predicate; 1]>,
}

impl MatchStep {
    /// A path segment step
    pub fn segment(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A name-less step matching any node
    pub fn anchor() -> Self {
        Self::default()
    }

    /// The `>` combinator
    pub fn direct_child() -> Self {
        Self {
            direct_child: true,
            ..Self::default()
        }
    }

    /// The synthetic step anchoring the document root
    pub fn root() -> Self {
        Self::segment(keywords::DOCUMENT)
    }

    /// True for the `>` combinator
    #[inline]
    pub fn is_combinator(&self) -> bool {
        self.direct_child
    }
}

/// Ordered step list for one query string
///
/// Steps are stored right to left: the step matching the selected node is
/// first and the synthetic root step is always last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledQuery {
    source: String,
    steps: Vec<MatchStep>,
}

impl CompiledQuery {
    pub(crate) fn new(source: impl Into<String>, steps: Vec<MatchStep>) -> Self {
        Self {
            source: source.into(),
            steps,
        }
    }

    /// The query text this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All steps, right to left
    pub fn steps(&self) -> &[MatchStep] {
        &self.steps
    }

    /// Number of steps including the root step
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when no steps exist; such a query never matches
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when the query names no node and tests nothing, as `""` or `">"`
    ///
    /// Such a query would only ever reach the bare root, so it matches nothing.
    pub fn is_vacuous(&self) -> bool {
        let Some((root, rest)) = self.steps.split_last() else {
            return true;
        };
        root.predicates.is_empty() && rest.iter().all(MatchStep::is_combinator)
    }

    /// The rightmost step of the query
    pub fn terminal(&self) -> Option<&MatchStep> {
        self.steps.first()
    }

    /// The synthetic root step
    pub fn root(&self) -> Option<&MatchStep> {
        self.steps.last()
    }

    /// Name of the rightmost step
    pub fn terminal_name(&self) -> Option<&str> {
        self.terminal().and_then(|step| step.name.as_deref())
    }

    /// True when the query selects `@type`
    pub fn selects_type(&self) -> bool {
        self.terminal_name() == Some(keywords::TYPE)
    }

    /// True when the query ends in a value-bearing keyword
    pub fn ends_in_value_keyword(&self) -> bool {
        self.terminal_name()
            .is_some_and(|name| keywords::FINAL.contains(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use rstest::rstest;

    #[rstest]
    #[case("@index", true)]
    #[case("@value", true)]
    #[case("@list", true)]
    #[case("@language", true)]
    #[case("@type", false)]
    #[case("@id", false)]
    #[case("ex:flag", false)]
    #[case("name", false)]
    fn test_literal_valued_keys(#[case] key: &str, #[case] literal: bool) {
        assert_eq!(is_literal_valued_key(key), literal);
    }

    #[test]
    fn test_predicate_compile() {
        let expander = Context::new().with_alias("ex", "http://x#").expander();

        let typed = Predicate::compile("@type", "ex:Person", &expander);
        assert_eq!(typed.key, "@type");
        assert_eq!(typed.expected, "http://x#Person");
        assert!(typed.expanded);

        let indexed = Predicate::compile("@index", "ex:first", &expander);
        assert_eq!(indexed.expected, "ex:first");
        assert!(!indexed.expanded);

        let flag = Predicate::compile("ex:flag", "true", &expander);
        assert_eq!(flag.key, "http://x#flag");
        assert_eq!(flag.expected, "true");
    }

    #[test]
    fn test_compiled_query_accessors() {
        let query = CompiledQuery::new(
            "ex:name @value",
            vec![
                MatchStep::segment("@value"),
                MatchStep::segment("http://x#name"),
                MatchStep::root(),
            ],
        );

        assert_eq!(query.len(), 3);
        assert_eq!(query.terminal_name(), Some("@value"));
        assert_eq!(query.root(), Some(&MatchStep::root()));
        assert!(query.ends_in_value_keyword());
        assert!(!query.selects_type());
        assert!(!query.is_vacuous());
    }

    #[test]
    fn test_vacuous_queries() {
        let expander = Context::new().with_alias("ex", "http://x#").expander();
        let vacuous = |query: &str| {
            let parts = crate::compiler::grammar::split(query);
            CompiledQuery::new(query, crate::compiler::grammar::assemble(&parts, &expander))
                .is_vacuous()
        };

        assert!(vacuous(""));
        assert!(vacuous("   "));
        assert!(vacuous(">"));
        assert!(vacuous(" > > "));
        assert!(CompiledQuery::new("", Vec::new()).is_vacuous());

        assert!(!vacuous("[@type=ex:Person]"));
        assert!(!vacuous("*"));
        assert!(!vacuous("ex:a >"));
    }
}
