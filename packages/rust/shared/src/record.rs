//! Flat input records from the legacy export and scalar coercion helpers.
//!
//! Legacy exports hand us loosely typed JSON: identifiers may arrive as
//! strings, flags as `"0"`/`"1"`, and missing values as `null`. The helpers
//! here coerce those values the same way the legacy system did, so a record
//! imports identically whatever scalar type the exporter picked.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CatalogImportError, Result};
use crate::types::CategoryId;

/// Legacy key → canonical key renames applied before a record is used.
pub const LEGACY_KEY_MAPPINGS: [(&str, &str); 4] = [
    ("description", "name"),
    ("cmsheadline", "cmsHeadline"),
    ("metakeywords", "metaKeywords"),
    ("metadescription", "metaDescription"),
];

/// A single category record as exported by the legacy system.
///
/// Keys map to arbitrary JSON scalars. A key holding `null` is treated as
/// absent by [`CategoryRecord::get`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRecord(BTreeMap<String, Value>);

impl CategoryRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(CatalogImportError::parse(format!(
                "category record must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Look up a key, treating `null` as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Whether `key` is present with a non-null value.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All entries, including ones holding `null`.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rename legacy keys to their canonical names.
    ///
    /// Only keys with a non-null value are moved; the legacy key is removed
    /// and any existing canonical value is overwritten.
    pub fn normalize_legacy_keys(&mut self) {
        for (legacy, canonical) in LEGACY_KEY_MAPPINGS {
            if !self.contains(legacy) {
                continue;
            }
            if let Some(value) = self.0.remove(legacy) {
                self.0.insert(canonical.to_string(), value);
            }
        }
    }

    /// The `name` value as text, if present.
    pub fn name(&self) -> Option<String> {
        self.get("name").map(value_to_text)
    }

    /// The `parent` value coerced to a category identifier, if present.
    pub fn parent(&self) -> Option<CategoryId> {
        self.get("parent").map(value_to_int)
    }
}

impl FromIterator<(String, Value)> for CategoryRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parse an export file: either one JSON array or one JSON value per line.
///
/// Blank lines are skipped in the line-delimited form.
pub fn parse_json_values(content: &str) -> Result<Vec<Value>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| CatalogImportError::parse(format!("invalid JSON array: {e}")));
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|e| CatalogImportError::parse(format!("line {}: {e}", idx + 1)))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Scalar coercion
// ---------------------------------------------------------------------------

/// Convert a scalar to text the way the legacy exporter rendered values.
///
/// Integral floats drop their fraction (`2.0` → `"2"`), `true` is `"1"` and
/// `false` is the empty string. Containers are rendered as compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".into(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(|f| f.to_string()).unwrap_or_default()
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Coerce a scalar to an integer identifier.
///
/// Strings contribute their leading optional sign and digits (`"12abc"` →
/// 12, `"abc"` → 0). Floats truncate toward zero. Out-of-range values
/// saturate.
pub fn value_to_int(value: &Value) -> i64 {
    match value {
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => parse_leading_int(s),
        Value::Null | Value::Array(_) | Value::Object(_) => 0,
    }
}

/// Coerce a scalar to a flag. `0`, `"0"`, `""`, `false`, `null` and empty
/// containers are false.
pub fn value_to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn parse_leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut acc: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        acc = acc.saturating_mul(10).saturating_add(d);
    }
    if negative { -acc } else { acc }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> CategoryRecord {
        CategoryRecord::from_value(value).expect("object record")
    }

    #[test]
    fn legacy_keys_are_renamed() {
        let mut rec = record(json!({
            "description": "Shoes",
            "cmsheadline": "All shoes",
            "metakeywords": "shoes, boots",
            "metadescription": "Footwear",
            "position": 3
        }));
        rec.normalize_legacy_keys();

        for (legacy, _) in LEGACY_KEY_MAPPINGS {
            assert!(rec.entries().all(|(k, _)| k != legacy), "{legacy} still present");
        }
        assert_eq!(rec.get("name"), Some(&json!("Shoes")));
        assert_eq!(rec.get("cmsHeadline"), Some(&json!("All shoes")));
        assert_eq!(rec.get("metaKeywords"), Some(&json!("shoes, boots")));
        assert_eq!(rec.get("metaDescription"), Some(&json!("Footwear")));
        assert_eq!(rec.get("position"), Some(&json!(3)));
    }

    #[test]
    fn legacy_key_overrides_canonical() {
        let mut rec = record(json!({ "name": "old", "description": "new" }));
        rec.normalize_legacy_keys();
        assert_eq!(rec.name().as_deref(), Some("new"));
    }

    #[test]
    fn null_legacy_key_is_left_alone() {
        let mut rec = record(json!({ "description": null, "name": "kept" }));
        rec.normalize_legacy_keys();
        assert_eq!(rec.name().as_deref(), Some("kept"));
        assert!(rec.entries().any(|(k, _)| k == "description"));
    }

    #[test]
    fn non_object_record_is_rejected() {
        let err = CategoryRecord::from_value(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn parses_array_and_json_lines() {
        let array = parse_json_values(r#" [{"name": "A"}, {"name": "B"}]"#).unwrap();
        assert_eq!(array.len(), 2);

        let lines = parse_json_values("{\"name\": \"A\"}\n\n{\"name\": \"B\"}\n").unwrap();
        assert_eq!(lines, array);

        let err = parse_json_values("{\"name\": \"A\"}\n{oops}\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn parent_is_coerced() {
        assert_eq!(record(json!({ "parent": "5" })).parent(), Some(5));
        assert_eq!(record(json!({ "parent": 7 })).parent(), Some(7));
        assert_eq!(record(json!({ "parent": null })).parent(), None);
        assert_eq!(record(json!({})).parent(), None);
    }

    #[test]
    fn text_coercion() {
        assert_eq!(value_to_text(&json!("red")), "red");
        assert_eq!(value_to_text(&json!(42)), "42");
        assert_eq!(value_to_text(&json!(1.5)), "1.5");
        assert_eq!(value_to_text(&json!(2.0)), "2");
        assert_eq!(value_to_text(&json!(true)), "1");
        assert_eq!(value_to_text(&json!(false)), "");
        assert_eq!(value_to_text(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn int_coercion() {
        assert_eq!(value_to_int(&json!(3)), 3);
        assert_eq!(value_to_int(&json!(3.9)), 3);
        assert_eq!(value_to_int(&json!(" 12abc")), 12);
        assert_eq!(value_to_int(&json!("-4")), -4);
        assert_eq!(value_to_int(&json!("abc")), 0);
        assert_eq!(value_to_int(&json!("")), 0);
        assert_eq!(value_to_int(&json!(true)), 1);
        assert_eq!(value_to_int(&json!(null)), 0);
    }

    #[test]
    fn bool_coercion() {
        assert!(value_to_bool(&json!(1)));
        assert!(value_to_bool(&json!("yes")));
        assert!(!value_to_bool(&json!(0)));
        assert!(!value_to_bool(&json!("0")));
        assert!(!value_to_bool(&json!("")));
        assert!(!value_to_bool(&json!(null)));
    }
}
