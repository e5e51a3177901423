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

//! Path expression grammar
//!
//! The grammar is permissive: anything that does not parse as a predicate or
//! a combinator is taken as a literal path segment. Compilation is two-pass.
//! [`split`] scans the text left to right into [`Part`]s, and [`assemble`]
//! attaches predicates and reorders the result right to left.

use super::step::{MatchStep, Predicate};
use crate::context::NameExpander;
use once_cell::sync::Lazy;
use regex::Regex;

/// `[key=value]`, optionally led by whitespace or `*` forcing a new anchor step
static PREDICATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(\s*\*?)\[(.+?)=(.+?)\](.*)").expect("valid predicate regex"));

/// `>` combinator
static DIRECT_CHILD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*>\s*(.*)").expect("valid combinator regex"));

/// A segment running up to the next whitespace, `[` or `>`
static SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(.+?)(\s.*|\[.*|>.*)").expect("valid segment regex"));

/// Segment text selecting any node
const WILDCARD: &str = "*";

/// Lexical unit of a path expression, in source order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part<'q> {
    /// Name-less step introduced by `*[..]` or ` [..]`
    Anchor,
    /// `[key=value]`
    Predicate {
        /// Trimmed key text
        key: &'q str,
        /// Trimmed value text
        value: &'q str,
    },
    /// `>`
    DirectChild,
    /// Path segment text, trimmed and non-empty
    Segment(&'q str),
}

/// Split a query into parts, left to right
pub fn split(query: &str) -> Vec<Part<'_>> {
    let mut parts = Vec::new();
    let mut rest = query.trim();
    while !rest.is_empty() {
        rest = extract(rest, &mut parts);
    }
    parts
}

/// Consume one part from the front of `input`, returning the remainder
fn extract<'q>(input: &'q str, parts: &mut Vec<Part<'q>>) -> &'q str {
    if let Some(caps) = PREDICATE.captures(input) {
        let (_, [lead, key, value, rest]) = caps.extract();
        if !lead.is_empty() {
            parts.push(Part::Anchor);
        }
        parts.push(Part::Predicate {
            key: key.trim(),
            value: value.trim(),
        });
        return rest;
    }

    if let Some(caps) = DIRECT_CHILD.captures(input) {
        let (_, [rest]) = caps.extract();
        parts.push(Part::DirectChild);
        return rest;
    }

    if let Some(caps) = SEGMENT.captures(input) {
        let (_, [segment, rest]) = caps.extract();
        push_segment(segment, parts);
        return rest;
    }

    push_segment(input, parts);
    ""
}

fn push_segment<'q>(text: &'q str, parts: &mut Vec<Part<'q>>) {
    let text = text.trim();
    if !text.is_empty() {
        parts.push(Part::Segment(text));
    }
}

/// Turn source-ordered parts into right-to-left match steps
///
/// A predicate decorates the nearest step to its left, or the synthetic root
/// step when nothing precedes it. A predicate right after `>` gets a
/// name-less step of its own, so `a > [k=v]` selects children of `a`. The
/// root step is always appended last.
pub fn assemble(parts: &[Part<'_>], expander: &NameExpander) -> Vec<MatchStep> {
    let mut root = MatchStep::root();
    let mut steps: Vec<MatchStep> = Vec::with_capacity(parts.len() + 1);

    for part in parts {
        match *part {
            Part::Predicate { key, value } => {
                if steps.last().is_some_and(MatchStep::is_combinator) {
                    steps.push(MatchStep::anchor());
                }
                let predicate = Predicate::compile(key, value, expander);
                steps.last_mut().unwrap_or(&mut root).predicates.push(predicate);
            }
            Part::Anchor => steps.push(MatchStep::anchor()),
            Part::DirectChild => steps.push(MatchStep::direct_child()),
            Part::Segment(WILDCARD) => steps.push(MatchStep::anchor()),
            Part::Segment(text) => steps.push(MatchStep::segment(expander.expand(text))),
        }
    }

    steps.reverse();
    steps.push(root);
    steps
}
