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

//! Context handling and name expansion
//!
//! A [`Context`] maps short aliases (and an optional default vocabulary) to
//! IRI prefixes. The [`NameExpander`] derived from it rewrites short property
//! names into their fully qualified form.

mod expand;

pub use expand::{NameExpander, is_keyword};

use crate::error::{LdQueryError, Result};
use indexmap::IndexMap;
use serde_json::Value;

/// Reserved structural keys recognised verbatim
pub mod keywords {
    /// Node identity
    pub const ID: &str = "@id";
    /// Node type
    pub const TYPE: &str = "@type";
    /// Ordered list container
    pub const LIST: &str = "@list";
    /// Index annotation
    pub const INDEX: &str = "@index";
    /// Literal value
    pub const VALUE: &str = "@value";
    /// Default vocabulary entry of a context
    pub const VOCAB: &str = "@vocab";
    /// Name of the synthetic root anchor
    pub const DOCUMENT: &str = "#document";

    /// Keywords whose selection is returned raw rather than wrapped
    pub const FINAL: [&str; 4] = [ID, INDEX, VALUE, TYPE];
}

/// Flat mapping of alias tokens to IRI prefixes
///
/// Alias order is the order in which entries were added (or appeared in the
/// source JSON object). The context is immutable once a query factory has
/// been built from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    aliases: IndexMap<String, String>,
    vocab: Option<String>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alias mapping; the `@vocab` key sets the default vocabulary
    pub fn with_alias(mut self, alias: impl Into<String>, iri: impl Into<String>) -> Self {
        let alias = alias.into();
        if alias == keywords::VOCAB {
            self.vocab = Some(iri.into());
        } else {
            self.aliases.insert(alias, iri.into());
        }
        self
    }

    /// Set the default vocabulary prepended to bare names
    pub fn with_vocab(mut self, iri: impl Into<String>) -> Self {
        self.vocab = Some(iri.into());
        self
    }

    /// Build a context from a JSON object
    ///
    /// Only string-valued entries are used. Other keywords (`@base`,
    /// `@language`, ...) and structured term definitions are skipped.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(LdQueryError::invalid_context(format!(
                "expected a JSON object, got {}",
                json_kind(value)
            )));
        };

        let mut context = Self::new();
        for (key, entry) in map {
            match entry {
                Value::String(iri) if key == keywords::VOCAB || !is_keyword(key) => {
                    context = context.with_alias(key.as_str(), iri.as_str());
                }
                _ => {
                    log::debug!("Skipping unsupported context entry '{key}'");
                }
            }
        }
        Ok(context)
    }

    /// Iterate alias mappings in definition order
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The IRI of the default vocabulary, if any
    pub fn vocab(&self) -> Option<&str> {
        self.vocab.as_deref()
    }

    /// Number of aliases, not counting the vocabulary
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// True when neither aliases nor a vocabulary are defined
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty() && self.vocab.is_none()
    }

    /// Derive the name expander for this context
    pub fn expander(&self) -> NameExpander {
        NameExpander::new(self)
    }
}

impl TryFrom<&Value> for Context {
    type Error = LdQueryError;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_json(value)
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |ctx, (alias, iri)| ctx.with_alias(alias, iri))
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
