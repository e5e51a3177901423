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

//! Attribute predicate evaluation

use crate::compiler::Predicate;
use crate::context::{NameExpander, keywords};
use serde_json::Value;

/// Test `predicate` against the value of a candidate node
///
/// The node must be an object holding the predicate's key. A collection on
/// the document side matches when any member matches. JSON-LD value and node
/// objects (`{"@value": ..}`, `{"@id": ..}`, `{"@list": [..]}`) are compared
/// by their content.
pub fn holds(predicate: &Predicate, node: &Value, expander: &NameExpander) -> bool {
    let Value::Object(members) = node else {
        return false;
    };

    members
        .iter()
        .filter(|(key, _)| expander.matches(key, &predicate.key))
        .any(|(_, value)| contains(predicate, value, expander))
}

fn contains(predicate: &Predicate, value: &Value, expander: &NameExpander) -> bool {
    match value {
        Value::Array(items) => items
            .iter()
            .any(|item| equals(predicate, item, expander)),
        other => equals(predicate, other, expander),
    }
}

fn equals(predicate: &Predicate, value: &Value, expander: &NameExpander) -> bool {
    match value {
        Value::String(text) => text_equals(predicate, text, expander),
        Value::Bool(flag) => text_equals(predicate, if *flag { "true" } else { "false" }, expander),
        Value::Number(number) => text_equals(predicate, &number.to_string(), expander),
        Value::Null => text_equals(predicate, "null", expander),
        Value::Object(members) => {
            if let Some(Value::Array(items)) = members.get(keywords::LIST) {
                return items.iter().any(|item| equals(predicate, item, expander));
            }
            members
                .get(keywords::VALUE)
                .or_else(|| members.get(keywords::ID))
                .is_some_and(|inner| !inner.is_object() && contains(predicate, inner, expander))
        }
        Value::Array(_) => false,
    }
}

fn text_equals(predicate: &Predicate, text: &str, expander: &NameExpander) -> bool {
    if predicate.expanded {
        expander.matches(text, &predicate.expected)
    } else {
        text == predicate.expected
    }
}
