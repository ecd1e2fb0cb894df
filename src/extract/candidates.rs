//! Locating the structured-data JSON object inside free-form model text
//!
//! A section usually mixes prose with one or more brace-delimited objects.
//! Every top-level balanced `{...}` span is a candidate; candidates that
//! parse as JSON objects are scored by how many of their keys are schema
//! fields, and the best one wins.
//!
//! Brace pairs are found in a single pass that tracks string literals, so
//! braces inside JSON strings do not affect balancing. When a span fails to
//! parse, the spans nested inside it are still tried, which recovers objects
//! wrapped in prose that happens to contain braces.

use crate::profile::{normalize_key, schema};
use serde_json::{Map, Value};

/// A span of a section that parsed as a JSON object
#[derive(Debug, Clone, PartialEq)]
pub struct JsonCandidate<'a> {
    /// The exact substring, braces included
    pub text: &'a str,
    /// Byte offset of the opening brace
    pub start: usize,
    pub object: Map<String, Value>,
    /// Number of keys that normalize to a schema field
    pub score: usize,
}

/// Outcome of [`find_best_json`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BestJson {
    /// The winning substring, `None` when nothing usable was found
    pub matched: Option<String>,
    /// The winning object, empty when nothing usable was found
    pub object: Map<String, Value>,
}

impl BestJson {
    pub fn is_found(&self) -> bool {
        self.matched.is_some()
    }
}

/// Count the keys of `object` that are schema fields after normalization.
pub fn schema_score(object: &Map<String, Value>) -> usize {
    object
        .keys()
        .filter(|k| schema::is_field(&normalize_key(k)))
        .count()
}

/// Every balanced `(open, close)` brace pair of `section`, ordered by
/// opening offset.
///
/// One pass with a stack of open positions. String literals are tracked
/// only while at least one brace is open, so quotes in surrounding prose
/// do not hide braces. Unclosed braces simply never pop.
fn brace_pairs(section: &str) -> Vec<(usize, usize)> {
    let mut open: Vec<usize> = Vec::new();
    let mut pairs = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in section.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    pairs.push((start, i));
                }
            }
            _ => {}
        }
    }

    // Pairs close innermost first; candidates are reported in scan order.
    pairs.sort_unstable_by_key(|&(start, _)| start);
    pairs
}

/// All parseable JSON-object spans of `section`, in scan order.
///
/// A span that parses consumes everything up to its closing brace, so
/// objects nested inside it are not reported separately. A span that fails
/// to parse does not, and the pairs opened inside it are tried next.
pub fn json_candidates(section: &str) -> Vec<JsonCandidate<'_>> {
    let mut candidates = Vec::new();
    let mut consumed = 0;

    for (start, end) in brace_pairs(section) {
        if start < consumed {
            continue;
        }
        let text = &section[start..=end];
        if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) {
            let score = schema_score(&object);
            candidates.push(JsonCandidate {
                text,
                start,
                object,
                score,
            });
            consumed = end + 1;
        }
    }

    candidates
}

/// Pick the candidate sharing the most keys with the field schema.
///
/// Only a strictly higher score replaces the current best, so ties keep the
/// earliest candidate and candidates scoring zero are never selected.
pub fn find_best_json(section: &str) -> BestJson {
    let mut best: Option<JsonCandidate<'_>> = None;

    for candidate in json_candidates(section) {
        let best_score = best.as_ref().map_or(0, |b| b.score);
        if candidate.score > best_score {
            best = Some(candidate);
        }
    }

    match best {
        Some(c) => BestJson {
            matched: Some(c.text.to_string()),
            object: c.object,
        },
        None => BestJson::default(),
    }
}
