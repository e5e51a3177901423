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

//! Shared fixtures for integration tests

#![allow(dead_code)]

use ld_query::Context;
use serde_json::{Value as JsonValue, json};

pub const SCHEMA: &str = "http://schema.org/";
pub const EXAMPLE: &str = "http://www.example.org#";

/// `so` and `ex` aliases
pub fn schema_context() -> Context {
    Context::new()
        .with_alias("so", SCHEMA)
        .with_alias("ex", EXAMPLE)
}

/// Default vocabulary only
pub fn vocab_context() -> Context {
    Context::new()
        .with_vocab(SCHEMA)
        .with_alias("ex", EXAMPLE)
}

/// An article written with compact `so:` / `ex:` names
pub fn compact_article() -> JsonValue {
    json!({
        "@id": "ex:article-1",
        "@type": ["so:Article"],
        "so:headline": [{ "@value": "Linked data in practice", "@language": "en" }],
        "so:author": [
            {
                "@id": "ex:ada",
                "@type": ["so:Person"],
                "so:name": [{ "@value": "Ada" }],
                "so:jobTitle": [{ "@value": "Engineer" }]
            },
            {
                "@id": "ex:alan",
                "@type": ["so:Person", "ex:Reviewer"],
                "so:name": [{ "@value": "Alan" }]
            }
        ],
        "so:keywords": [
            { "@value": "json-ld", "@index": "primary" },
            { "@value": "query" }
        ],
        "ex:grabThis": [{ "@value": "top" }]
    })
}

/// The same article in expanded form
pub fn expanded_article() -> JsonValue {
    json!({
        "@id": "http://www.example.org#article-1",
        "@type": ["http://schema.org/Article"],
        "http://schema.org/headline": [{ "@value": "Linked data in practice", "@language": "en" }],
        "http://schema.org/author": [
            {
                "@id": "http://www.example.org#ada",
                "@type": ["http://schema.org/Person"],
                "http://schema.org/name": [{ "@value": "Ada" }],
                "http://schema.org/jobTitle": [{ "@value": "Engineer" }]
            },
            {
                "@id": "http://www.example.org#alan",
                "@type": ["http://schema.org/Person", "http://www.example.org#Reviewer"],
                "http://schema.org/name": [{ "@value": "Alan" }]
            }
        ],
        "http://schema.org/keywords": [
            { "@value": "json-ld", "@index": "primary" },
            { "@value": "query" }
        ],
        "http://www.example.org#grabThis": [{ "@value": "top" }]
    })
}
