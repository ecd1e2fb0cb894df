//! Key/value normalization into a complete [`ExtractedProfile`]

use super::schema::{self, FIELDS};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical value for any field the model left empty or unknown.
pub const PLACEHOLDER: &str = "Not specified";

/// Lowercased values treated as "no information".
const MEANINGLESS_VALUES: &[&str] = &["not specified", "unknown", "n/a", "none"];

/// Normalize a raw key: trim, lowercase, spaces and hyphens to underscores.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Stringify and clean a raw value, mapping empty/meaningless values to
/// [`PLACEHOLDER`].
pub fn normalize_value(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string().trim().to_string(),
    };

    if text.is_empty() || MEANINGLESS_VALUES.contains(&text.to_lowercase().as_str()) {
        PLACEHOLDER.to_string()
    } else {
        text
    }
}

/// A profile holding one value for every schema field.
///
/// The set of keys always equals the field schema: values are stored by
/// schema position, so missing fields cannot exist and foreign keys cannot
/// be inserted. Serializes as a JSON object in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedProfile {
    values: Vec<String>,
}

impl Default for ExtractedProfile {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl ExtractedProfile {
    /// A profile with every field set to [`PLACEHOLDER`]
    pub fn placeholder() -> Self {
        Self {
            values: vec![PLACEHOLDER.to_string(); FIELDS.len()],
        }
    }

    /// Value of a field by canonical name
    pub fn get(&self, field: &str) -> Option<&str> {
        schema::position(field).map(|pos| self.values[pos].as_str())
    }

    /// Iterate `(field, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        FIELDS
            .iter()
            .zip(self.values.iter())
            .map(|(f, v)| (f.name, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of fields holding something other than the placeholder
    pub fn specified_count(&self) -> usize {
        self.values.iter().filter(|v| v.as_str() != PLACEHOLDER).count()
    }

    /// Render as a JSON object (schema order)
    pub fn to_map(&self) -> Map<String, Value> {
        self.iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    fn set(&mut self, pos: usize, value: String) {
        self.values[pos] = value;
    }
}

/// Normalize a raw parsed mapping into a complete profile.
///
/// Keys are normalized and filtered to the schema; when two raw keys land on
/// the same field, the later one wins. Fields never mentioned stay at
/// [`PLACEHOLDER`].
pub fn normalize_profile(raw: &Map<String, Value>) -> ExtractedProfile {
    let mut profile = ExtractedProfile::placeholder();
    for (key, value) in raw {
        if let Some(pos) = schema::position(&normalize_key(key)) {
            profile.set(pos, normalize_value(value));
        }
    }
    profile
}

impl Serialize for ExtractedProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ExtractedProfile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        Ok(normalize_profile(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn key_normalization() {
        assert_eq!(normalize_key("  Company Name "), "company_name");
        assert_eq!(normalize_key("Burn-Rate"), "burn_rate");
        assert_eq!(normalize_key("TAM"), "tam");
    }

    #[test]
    fn meaningless_values_become_placeholder() {
        for raw in ["", "   ", "N/A", "  n/a  ", "Unknown", "NONE", "not specified"] {
            assert_eq!(normalize_value(&json!(raw)), PLACEHOLDER, "input {:?}", raw);
        }
        assert_eq!(normalize_value(&Value::Null), PLACEHOLDER);
    }

    #[test]
    fn non_string_values_are_stringified() {
        assert_eq!(normalize_value(&json!(4.5)), "4.5");
        assert_eq!(normalize_value(&json!(120)), "120");
        assert_eq!(normalize_value(&json!(true)), "true");
        assert_eq!(normalize_value(&json!(["Delhi", "Pune"])), r#"["Delhi","Pune"]"#);
    }

    #[test]
    fn normalized_profile_covers_exactly_the_schema() {
        let raw = as_map(json!({
            "Company Name": "Acme",
            "INDUSTRY": "tech",
            "favourite_color": "blue",
            "burn-rate": " $50k/month ",
        }));
        let profile = normalize_profile(&raw);

        assert_eq!(profile.len(), FIELDS.len());
        assert_eq!(profile.get("company_name"), Some("Acme"));
        assert_eq!(profile.get("industry"), Some("tech"));
        assert_eq!(profile.get("burn_rate"), Some("$50k/month"));
        assert_eq!(profile.get("favourite_color"), None);
        assert_eq!(profile.get("revenue"), Some(PLACEHOLDER));
        assert_eq!(profile.specified_count(), 3);
    }

    #[test]
    fn later_duplicate_key_wins() {
        let raw = as_map(json!({ "company name": "First", "Company-Name": "Second" }));
        assert_eq!(normalize_profile(&raw).get("company_name"), Some("Second"));
    }

    #[test]
    fn normalizing_a_normalized_profile_is_a_fixed_point() {
        let raw = as_map(json!({ "company_name": "Acme", "valuation": "unknown" }));
        let once = normalize_profile(&raw);
        let twice = normalize_profile(&once.to_map());
        assert_eq!(once, twice);
    }

    #[test]
    fn complete_profile_round_trips_modulo_trimming() {
        let raw: Map<String, Value> = FIELDS
            .iter()
            .map(|f| (f.name.to_string(), json!(format!("  value for {}  ", f.name))))
            .collect();
        let profile = normalize_profile(&raw);
        for (name, value) in profile.iter() {
            assert_eq!(value, format!("value for {}", name));
        }
    }

    #[test]
    fn serializes_in_schema_order_and_deserializes_through_normalization() {
        let profile = normalize_profile(&as_map(json!({ "industry": "tech" })));
        let text = serde_json::to_string(&profile).unwrap();
        assert!(text.starts_with(r#"{"company_name":"Not specified","website_url""#));

        let loaded: ExtractedProfile =
            serde_json::from_str(r#"{"Industry": "tech", "extra": "x"}"#).unwrap();
        assert_eq!(loaded, profile);
    }
}
