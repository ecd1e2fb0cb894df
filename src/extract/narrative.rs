//! Low-confidence fallback for responses that carry no structured data
//!
//! When no JSON object can be located, registered recognizers get a chance
//! to pre-fill a few profile fields from the narrative text. The first
//! recognizer that produces a mapping wins; with no match the mapping is
//! empty and normalization fills every field with the placeholder.

use serde_json::{Map, Value};

/// Attempts a partial extraction from narrative text
pub trait NarrativeRecognizer: Send + Sync {
    /// Unique identifier, used in logs
    fn id(&self) -> &str;

    /// Return a raw key/value mapping when the text is recognized
    fn recognize(&self, text: &str) -> Option<Map<String, Value>>;
}

/// Recognizes a case-insensitive keyword and emits fixed field values.
pub struct KeywordRecognizer {
    id: String,
    keyword: String,
    fields: Map<String, Value>,
}

impl KeywordRecognizer {
    pub fn new(id: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keyword: keyword.into().to_lowercase(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Value::String(value.into()));
        self
    }
}

impl NarrativeRecognizer for KeywordRecognizer {
    fn id(&self) -> &str {
        &self.id
    }

    fn recognize(&self, text: &str) -> Option<Map<String, Value>> {
        text.to_lowercase()
            .contains(&self.keyword)
            .then(|| self.fields.clone())
    }
}

/// Ordered set of narrative recognizers
pub struct NarrativeRegistry {
    recognizers: Vec<Box<dyn NarrativeRecognizer>>,
}

impl Default for NarrativeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NarrativeRegistry {
    /// A registry with no recognizers: the fallback always yields nothing
    pub fn empty() -> Self {
        Self {
            recognizers: Vec::new(),
        }
    }

    /// The recognizers shipped with the service
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            KeywordRecognizer::new("reddit", "reddit")
                .with_field("company_name", "Reddit")
                .with_field("industry", "Social Media Platform")
                .with_field("business_model", "Advertising (sponsored posts, display ads)"),
        );
        registry
    }

    pub fn register<R: NarrativeRecognizer + 'static>(&mut self, recognizer: R) {
        self.recognizers.push(Box::new(recognizer));
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.recognizers.iter().map(|r| r.id()).collect()
    }

    /// Run recognizers in registration order; empty mapping when none match
    pub fn recognize(&self, text: &str) -> Map<String, Value> {
        for recognizer in &self.recognizers {
            if let Some(fields) = recognizer.recognize(text) {
                tracing::debug!(recognizer = recognizer.id(), "narrative fallback matched");
                return fields;
            }
        }
        Map::new()
    }
}
