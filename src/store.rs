//! Typed, path-based read access over a nested configuration document
//!
//! `ConfigStore` holds the merged document and resolves dot-separated paths
//! into typed values. Every getter takes a default and never fails: a
//! missing path, a wrong shape, or an unparseable value degrades to the
//! default instead of returning an error.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};

use crate::loader::ConfigSource;
use crate::merge::deep_merge;

/// Default format for date values (chrono strftime syntax).
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default format for datetime values (chrono strftime syntax).
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// String forms accepted as boolean `true` (case-insensitive).
const TRUE_WORDS: &[&str] = &["true", "on", "yes", "1"];

/// String forms accepted as boolean `false` (case-insensitive).
const FALSE_WORDS: &[&str] = &["false", "off", "no", "none", "0"];

/// Layered configuration store.
///
/// Holds an optional document (`None` until one is loaded or merged in)
/// plus the formats used by the date getters. Stores merge in ascending
/// priority order: the document passed to [`merge_with`](Self::merge_with)
/// overrides this one at every conflicting leaf.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    /// Merged document; `None` until a document is loaded or merged in.
    doc: Option<Value>,

    /// Format for [`get_date`](Self::get_date).
    date_format: String,

    /// Format for [`get_datetime`](Self::get_datetime).
    datetime_format: String,

    /// Contributing file sources in merge order.
    sources: Vec<ConfigSource>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            doc: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            sources: Vec::new(),
        }
    }
}

impl ConfigStore {
    /// Create an empty store. Every getter returns its default until a
    /// document is loaded or merged in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store over an already-parsed document.
    pub fn from_value(doc: Value) -> Self {
        Self {
            doc: Some(doc),
            ..Self::default()
        }
    }

    /// Set the format used by [`get_date`](Self::get_date).
    /// The format string itself is not validated.
    pub fn set_date_format(&mut self, format: impl Into<String>) {
        self.date_format = format.into();
    }

    /// Set the format used by [`get_datetime`](Self::get_datetime).
    /// The format string itself is not validated.
    pub fn set_datetime_format(&mut self, format: impl Into<String>) {
        self.datetime_format = format.into();
    }

    /// Raw lookup of the node at `path` (dot-separated literal segments).
    ///
    /// Returns `None` when the store is empty, a segment misses, or descent
    /// is required through a scalar. Numeric segments index into sequences.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = self.doc.as_ref()?;
        for part in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Node at `path` unless absent or explicitly `null`.
    fn resolved(&self, path: &str) -> Option<&Value> {
        self.get(path).filter(|value| !value.is_null())
    }

    /// Get the raw value at `path`, or `default` when the path is absent or
    /// holds `null`. Present-but-falsy values (`false`, `0`, `""`) are
    /// returned as stored.
    pub fn get_value(&self, path: &str, default: Value) -> Value {
        self.resolved(path).cloned().unwrap_or(default)
    }

    /// Get the value at `path` as a string. Scalars are stringified;
    /// mappings and sequences yield the default.
    pub fn get_string(&self, path: &str, default: &str) -> String {
        self.resolved(path)
            .and_then(scalar_string)
            .unwrap_or_else(|| default.to_string())
    }

    /// Get the value at `path` as an integer.
    ///
    /// Numbers and bools coerce numerically; strings use loose numeric
    /// parsing where non-numeric text yields 0, not the default. Only an
    /// absent path (or a container value) yields the default.
    pub fn get_int(&self, path: &str, default: i64) -> i64 {
        match self.resolved(path) {
            Some(Value::Number(n)) => n
                .as_i64()
                .unwrap_or_else(|| n.as_f64().map_or(0, |f| f as i64)),
            Some(Value::Bool(b)) => i64::from(*b),
            Some(Value::String(s)) => int_from_str(s),
            _ => default,
        }
    }

    /// Get the value at `path` as a float. Same coercion contract as
    /// [`get_int`](Self::get_int).
    pub fn get_float(&self, path: &str, default: f64) -> f64 {
        match self.resolved(path) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::Bool(b)) => f64::from(u8::from(*b)),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => default,
        }
    }

    /// Get the value at `path` as a bool.
    ///
    /// Raw bools pass through. Otherwise the string form is compared
    /// case-insensitively against `true, on, yes, 1` and
    /// `false, off, no, none, 0`; any other value yields the default.
    pub fn get_bool(&self, path: &str, default: bool) -> bool {
        match self.resolved(path) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(value) => scalar_string(value)
                .map_or(default, |s| bool_from_str(&s, default)),
        }
    }

    /// Get the mapping or sequence at `path`; any scalar yields the default.
    pub fn get_array(&self, path: &str, default: Value) -> Value {
        match self.resolved(path) {
            Some(value @ (Value::Array(_) | Value::Object(_))) => value.clone(),
            _ => default,
        }
    }

    /// Get the value at `path` as a unix timestamp for a calendar date.
    ///
    /// All-digit strings are taken as a timestamp directly. Anything else is
    /// parsed with the configured date format, normalized to midnight UTC.
    /// Parse failures yield the default.
    pub fn get_date(&self, path: &str, default: i64) -> i64 {
        let Some(raw) = self.resolved(path).and_then(scalar_string) else {
            return default;
        };
        if let Some(stamp) = digit_timestamp(&raw) {
            return stamp;
        }
        NaiveDate::parse_from_str(&raw, &self.date_format)
            .map(|date| date.and_time(NaiveTime::MIN).and_utc().timestamp())
            .unwrap_or(default)
    }

    /// Get the value at `path` as a unix timestamp, preserving time-of-day.
    ///
    /// Same contract as [`get_date`](Self::get_date) but parsed with the
    /// configured datetime format.
    pub fn get_datetime(&self, path: &str, default: i64) -> i64 {
        let Some(raw) = self.resolved(path).and_then(scalar_string) else {
            return default;
        };
        if let Some(stamp) = digit_timestamp(&raw) {
            return stamp;
        }
        NaiveDateTime::parse_from_str(&raw, &self.datetime_format)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(default)
    }

    /// Merge another store into this one; the other store's values win at
    /// every conflicting leaf. Merge repeatedly in ascending priority order.
    ///
    /// Mappings merge key by key, sequences are replaced wholesale (see
    /// [`deep_merge`]). An empty store adopts the other's document.
    pub fn merge_with(&mut self, other: &ConfigStore) {
        let incoming = other.config();
        self.doc = Some(match self.doc.take() {
            None => incoming,
            Some(base) => deep_merge(base, incoming),
        });
        self.sources.extend(other.sources.iter().cloned());
    }

    /// The raw document; an empty mapping if none has been loaded.
    pub fn config(&self) -> Value {
        self.doc
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Contributing file sources in merge order.
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    pub(crate) fn push_source(&mut self, source: ConfigSource) {
        self.sources.push(source);
    }
}

/// String form of a scalar; `None` for mappings, sequences and null.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Loose integer parsing: integer form, then float form truncated, then 0.
fn int_from_str(s: &str) -> i64 {
    let s = s.trim();
    s.parse::<i64>()
        .or_else(|_| s.parse::<f64>().map(|f| f as i64))
        .unwrap_or(0)
}

fn bool_from_str(s: &str, default: bool) -> bool {
    let lower = s.to_lowercase();
    if TRUE_WORDS.contains(&lower.as_str()) {
        true
    } else if FALSE_WORDS.contains(&lower.as_str()) {
        false
    } else {
        default
    }
}

/// Parse a nonempty all-digit string as a unix timestamp.
fn digit_timestamp(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_store() -> ConfigStore {
        ConfigStore::from_value(json!({
            "app": {
                "name": "demo",
                "workers": 4,
                "ratio": 0.5,
                "debug": "on",
                "labels": ["a", "b"],
                "disabled": false,
                "empty": "",
                "missing_value": null
            }
        }))
    }

    #[test]
    fn test_get_walks_nested_paths() {
        let store = sample_store();
        assert_eq!(store.get("app.name"), Some(&json!("demo")));
        assert_eq!(store.get("app.labels.1"), Some(&json!("b")));
        assert_eq!(store.get("app.nope"), None);
        // Descent through a scalar is a miss, not a panic.
        assert_eq!(store.get("app.name.deeper"), None);
    }

    #[test]
    fn test_absent_paths_return_defaults() {
        let store = sample_store();
        assert_eq!(store.get_string("no.such.key", "fallback"), "fallback");
        assert_eq!(store.get_int("no.such.key", 42), 42);
        assert_eq!(store.get_float("no.such.key", 1.25), 1.25);
        assert!(store.get_bool("no.such.key", true));
        assert_eq!(store.get_date("no.such.key", 7), 7);
        assert_eq!(store.get_array("no.such.key", json!([])), json!([]));
    }

    #[test]
    fn test_empty_store_returns_defaults() {
        let store = ConfigStore::new();
        assert_eq!(store.get_string("anything", "d"), "d");
        assert_eq!(store.config(), json!({}));
    }

    #[test]
    fn test_present_but_falsy_is_returned() {
        let store = sample_store();
        assert!(!store.get_bool("app.disabled", true));
        assert_eq!(store.get_string("app.empty", "fallback"), "");
        assert_eq!(store.get_value("app.disabled", json!(1)), json!(false));
    }

    #[test]
    fn test_explicit_null_counts_as_missing() {
        let store = sample_store();
        assert_eq!(store.get_string("app.missing_value", "d"), "d");
        assert_eq!(store.get_value("app.missing_value", json!(9)), json!(9));
    }

    #[test]
    fn test_get_string_coerces_scalars() {
        let store = sample_store();
        assert_eq!(store.get_string("app.workers", ""), "4");
        assert_eq!(store.get_string("app.disabled", ""), "false");
        // Containers are not stringified.
        assert_eq!(store.get_string("app.labels", "d"), "d");
    }

    #[test]
    fn test_get_int_loose_coercion() {
        let store = ConfigStore::from_value(json!({
            "n": "12",
            "f": "3.9",
            "junk": "abc",
            "b": true
        }));
        assert_eq!(store.get_int("n", 0), 12);
        assert_eq!(store.get_int("f", 0), 3);
        // Non-numeric text yields 0, NOT the default.
        assert_eq!(store.get_int("junk", 42), 0);
        assert_eq!(store.get_int("b", 0), 1);
        assert_eq!(store.get_int("absent", 42), 42);
    }

    #[test]
    fn test_get_float_loose_coercion() {
        let store = ConfigStore::from_value(json!({
            "f": "2.5",
            "junk": "xyz"
        }));
        assert_eq!(store.get_float("f", 0.0), 2.5);
        assert_eq!(store.get_float("junk", 9.9), 0.0);
        assert_eq!(store.get_float("absent", 9.9), 9.9);
    }

    #[test]
    fn test_get_bool_word_sets() {
        let store = ConfigStore::from_value(json!({
            "t1": "YES", "t2": "on", "t3": "1", "t4": true,
            "f1": "no", "f2": "NONE", "f3": "0", "f4": false,
            "odd": "maybe", "n": 1
        }));
        for path in ["t1", "t2", "t3", "t4"] {
            assert!(store.get_bool(path, false), "{path} should be true");
        }
        for path in ["f1", "f2", "f3", "f4"] {
            assert!(!store.get_bool(path, true), "{path} should be false");
        }
        assert!(store.get_bool("odd", true));
        assert!(!store.get_bool("odd", false));
        // Numbers go through their string form.
        assert!(store.get_bool("n", false));
    }

    #[test]
    fn test_get_array() {
        let store = sample_store();
        assert_eq!(store.get_array("app.labels", json!([])), json!(["a", "b"]));
        assert_eq!(
            store.get_array("app", json!({}))["name"],
            json!("demo")
        );
        // Scalars yield the default.
        assert_eq!(store.get_array("app.name", json!([])), json!([]));
    }

    #[test]
    fn test_get_date_default_format() {
        let store = ConfigStore::from_value(json!({
            "d": "2021-01-22",
            "bad": "22.01.2021",
            "stamp": "1611273600"
        }));
        assert_eq!(store.get_date("d", 0), 1_611_273_600);
        assert_eq!(store.get_date("bad", 0), 0);
        // All-digit strings are already a timestamp.
        assert_eq!(store.get_date("stamp", 0), 1_611_273_600);
    }

    #[test]
    fn test_get_date_custom_format() {
        let mut store = ConfigStore::from_value(json!({"d": "22.01.2021"}));
        store.set_date_format("%d.%m.%Y");
        assert_eq!(store.get_date("d", 0), 1_611_273_600);
    }

    #[test]
    fn test_get_datetime_preserves_time_of_day() {
        let mut store = ConfigStore::from_value(json!({
            "dt": "2021-01-22 14:30",
            "custom": "22.01.2021 14:30:15"
        }));
        assert_eq!(store.get_datetime("dt", 0), 1_611_325_800);

        store.set_datetime_format("%d.%m.%Y %H:%M:%S");
        assert_eq!(store.get_datetime("custom", 0), 1_611_325_815);
        // The date format is untouched by the datetime format.
        assert_eq!(store.get_datetime("dt", -1), -1);
    }

    #[test]
    fn test_merge_with_overrides_leaves() {
        let mut base = ConfigStore::from_value(json!({
            "a": {"c1": "red", "c2": "green"}
        }));
        let overlay = ConfigStore::from_value(json!({
            "a": {"c2": "blue", "c3": "yellow"}
        }));
        base.merge_with(&overlay);

        assert_eq!(
            base.config(),
            json!({"a": {"c1": "red", "c2": "blue", "c3": "yellow"}})
        );
    }

    #[test]
    fn test_merge_into_empty_adopts_document() {
        let mut base = ConfigStore::new();
        base.merge_with(&sample_store());
        assert_eq!(base.get_string("app.name", ""), "demo");
    }

    #[test]
    fn test_merge_replaces_sequences() {
        let mut base = ConfigStore::from_value(json!({"a": [1, 2, 3]}));
        base.merge_with(&ConfigStore::from_value(json!({"a": [9]})));
        assert_eq!(base.config(), json!({"a": [9]}));
    }
}
