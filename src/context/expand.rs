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

//! Alias and vocabulary expansion of property names

use super::Context;
use std::borrow::Cow;

/// True for reserved structural names (`@id`, `@type`, `@list`, ...)
#[inline]
pub fn is_keyword(name: &str) -> bool {
    name.starts_with('@')
}

/// True for names carrying no alias or scheme prefix (`name`, `author`)
#[inline]
fn is_bare_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(':')
}

/// Rewrites short property names into fully qualified IRIs
///
/// Expansion is a pure function of the context it was built from: the same
/// input always produces the same output.
#[derive(Debug, Clone, Default)]
pub struct NameExpander {
    /// `("alias:", iri)` pairs in context order
    prefixes: Vec<(String, String)>,
    vocab: Option<String>,
}

impl NameExpander {
    /// Build an expander for the given context
    pub fn new(context: &Context) -> Self {
        Self {
            prefixes: context
                .aliases()
                .map(|(alias, iri)| (format!("{alias}:"), iri.to_string()))
                .collect(),
            vocab: context.vocab().map(str::to_string),
        }
    }

    /// Expand a single name
    ///
    /// Keywords are returned untouched. The first alias whose `alias:` prefix
    /// starts the name is replaced by its IRI. Bare names get the default
    /// vocabulary prepended when one is defined.
    pub fn expand<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self.split(name) {
            Some((iri, local)) => Cow::Owned(format!("{iri}{local}")),
            None => Cow::Borrowed(name),
        }
    }

    /// True when the name expands to exactly `expanded`
    ///
    /// Accepts both the raw and the expanded spelling so compact and
    /// expanded documents compare alike. Never allocates.
    pub fn matches(&self, name: &str, expanded: &str) -> bool {
        name == expanded
            || self
                .split(name)
                .is_some_and(|(iri, local)| expanded.strip_prefix(iri) == Some(local))
    }

    /// The IRI prefix and local part a name expands into, if it expands
    fn split<'s, 'n>(&'s self, name: &'n str) -> Option<(&'s str, &'n str)> {
        if is_keyword(name) {
            return None;
        }

        for (prefix, iri) in &self.prefixes {
            if let Some(local) = name.strip_prefix(prefix.as_str()) {
                return Some((iri.as_str(), local));
            }
        }

        match &self.vocab {
            Some(vocab) if is_bare_name(name) => Some((vocab.as_str(), name)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn expander() -> NameExpander {
        Context::new()
            .with_alias("ex", "http://x#")
            .with_alias("so", "http://schema.org/")
            .with_vocab("http://vocab.org/")
            .expander()
    }

    #[rstest]
    #[case("ex:name", "http://x#name")]
    #[case("so:author", "http://schema.org/author")]
    #[case("name", "http://vocab.org/name")]
    #[case("@type", "@type")]
    #[case("@id", "@id")]
    #[case("@value", "@value")]
    #[case("http://other.org/name", "http://other.org/name")]
    #[case("unknown:name", "unknown:name")]
    #[case("", "")]
    fn test_expand(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(expander().expand(input), expected);
    }

    #[test]
    fn test_expand_vocab_only() {
        let expander = Context::new().with_vocab("http://x#").expander();
        assert_eq!(expander.expand("name"), "http://x#name");
        assert_eq!(expander.expand("@type"), "@type");
        assert_eq!(expander.expand("ex:name"), "ex:name");
    }

    #[test]
    fn test_expand_alias_only() {
        let expander = Context::new().with_alias("ex", "http://x#").expander();
        assert_eq!(expander.expand("ex:name"), "http://x#name");
        assert_eq!(expander.expand("name"), "name");
    }

    #[test]
    fn test_expand_borrows_when_unchanged() {
        let expander = expander();
        assert!(matches!(expander.expand("@list"), Cow::Borrowed(_)));
        assert!(matches!(expander.expand("ex:name"), Cow::Owned(_)));
    }

    #[test]
    fn test_expand_is_referentially_transparent() {
        let expander = expander();
        let first = expander.expand("ex:name").into_owned();
        let second = expander.expand("ex:name").into_owned();
        assert_eq!(first, second);
    }

    #[test]
    fn test_alias_anchored_at_start() {
        let expander = expander();
        assert_eq!(expander.expand("my-ex:name"), "my-ex:name");
    }

    #[test]
    fn test_matches_raw_or_expanded() {
        let expander = expander();
        assert!(expander.matches("ex:name", "http://x#name"));
        assert!(expander.matches("http://x#name", "http://x#name"));
        assert!(!expander.matches("ex:other", "http://x#name"));
    }

    #[rstest]
    #[case("ex:name", "http://x#name", true)]
    #[case("ex:name", "http://x#names", false)]
    #[case("ex:name", "http://x#nam", false)]
    #[case("ex:name", "http://schema.org/name", false)]
    #[case("so:name", "http://schema.org/name", true)]
    #[case("name", "http://vocab.org/name", true)]
    #[case("name", "http://x#name", false)]
    #[case("@type", "@type", true)]
    #[case("@type", "http://vocab.org/@type", false)]
    #[case("unknown:name", "unknown:name", true)]
    #[case("unknown:name", "http://vocab.org/unknown:name", false)]
    fn test_matches_agrees_with_expand(
        #[case] name: &str,
        #[case] expanded: &str,
        #[case] expected: bool,
    ) {
        let expander = expander();
        assert_eq!(expander.matches(name, expanded), expected);
        assert_eq!(
            name == expanded || expander.expand(name) == expanded,
            expected
        );
    }
}
