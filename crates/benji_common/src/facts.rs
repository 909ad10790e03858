//! FactBundle - the evolving key-value record of everything known about one user.
//!
//! An open, JSON-shaped map (demographics, goal text, medications, check-in
//! history, cached tool results) with typed accessors for the handful of keys
//! the core logic actually reads. One bundle is owned by exactly one
//! orchestrator session; nothing here is shared across requests.

use crate::medication::Medication;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker appended when the serialized bundle is cut to a prompt budget.
const TRUNCATION_MARKER: &str = "...[truncated]";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactBundle(Map<String, Value>);

impl FactBundle {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a bundle from any JSON value. Non-objects yield an empty bundle.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self(Map::new()),
        }
    }

    /// Merge incoming facts into this bundle.
    ///
    /// Caller-supplied facts win over previously stored facts for any key
    /// present in both. Null values and empty strings are ignored so a
    /// partial payload never erases a known fact.
    pub fn merge(&mut self, incoming: &Value) {
        let Some(map) = incoming.as_object() else {
            return;
        };
        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            if value.as_str().is_some_and(|s| s.is_empty()) {
                continue;
            }
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric fact, accepting either a JSON number or a numeric string.
    /// A height like `5'10"` is simply not a number here.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.as_str()
    }

    pub fn array(&self, key: &str) -> Option<&Vec<Value>> {
        self.0.get(key)?.as_array()
    }

    /// Medication list, silently dropping entries that don't deserialize.
    pub fn medications(&self) -> Vec<Medication> {
        self.array("medications")
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Serialized view of the bundle bounded to `budget` characters, for
    /// embedding in generation prompts. Appends a marker when cut.
    pub fn excerpt(&self, budget: usize) -> String {
        let full = serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string());
        if full.chars().count() <= budget {
            return full;
        }
        let mut cut: String = full.chars().take(budget).collect();
        cut.push_str(TRUNCATION_MARKER);
        cut
    }
}
