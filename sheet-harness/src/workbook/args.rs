//! Loose accessors over the JSON arguments a model sends with a tool call.
//!
//! Models are sloppy: numbers arrive as strings, empty strings stand in for
//! "not given", and 2-D arrays sometimes arrive JSON-encoded. Accept all of it.

use serde_json::{Map, Value};

use crate::address::{CellRange, CellRef};

pub(super) fn parse_cell(raw: &str) -> Result<CellRef, String> {
    CellRef::parse(raw).map_err(|e| format!("Invalid cell reference '{}': {}", raw, e))
}

pub(super) fn parse_range(raw: &str) -> Result<CellRange, String> {
    CellRange::parse(raw).map_err(|e| format!("Invalid range '{}': {}", raw, e))
}

fn missing(key: &str) -> String {
    format!("Missing required argument '{}'", key)
}

pub(super) struct Args<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Args<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self {
            map: value.as_object(),
        }
    }

    /// Raw value; JSON `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map?.get(key).filter(|v| !v.is_null())
    }

    /// Non-empty string value.
    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn require_str(&self, key: &str) -> Result<&'a str, String> {
        self.str(key).ok_or_else(|| missing(key))
    }

    /// A string that must be present but may be empty (e.g. a replacement text).
    pub fn require_text(&self, key: &str) -> Result<&'a str, String> {
        self.get(key).and_then(Value::as_str).ok_or_else(|| missing(key))
    }

    pub fn require_value(&self, key: &str) -> Result<&'a Value, String> {
        self.map
            .and_then(|m| m.get(key))
            .ok_or_else(|| missing(key))
    }

    /// Integer from a JSON number or a numeric string.
    pub fn int(&self, key: &str) -> Result<Option<i64>, String> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| format!("Argument '{}' must be an integer", key))
    }

    pub fn require_int(&self, key: &str) -> Result<i64, String> {
        self.int(key)?.ok_or_else(|| missing(key))
    }

    pub fn bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn str_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        }
    }

    /// Rows of a 2-D array. A JSON-encoded string is decoded first; a row that
    /// is not itself an array is treated as a single-cell row.
    pub fn grid(&self, key: &str) -> Result<Vec<Vec<Value>>, String> {
        let value = self.get(key).ok_or_else(|| missing(key))?;
        let decoded;
        let rows = match value {
            Value::Array(rows) => rows,
            Value::String(s) => {
                decoded = serde_json::from_str::<Value>(s)
                    .map_err(|_| format!("Argument '{}' must be a 2D array", key))?;
                decoded
                    .as_array()
                    .ok_or_else(|| format!("Argument '{}' must be a 2D array", key))?
            }
            _ => return Err(format!("Argument '{}' must be a 2D array", key)),
        };
        Ok(rows
            .iter()
            .map(|row| match row {
                Value::Array(cells) => cells.clone(),
                other => vec![other.clone()],
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_strings_are_absent() {
        let v = json!({"sheet": "  ", "cell": "A1"});
        let args = Args::new(&v);
        assert_eq!(args.str("sheet"), None);
        assert_eq!(args.str("cell"), Some("A1"));
        assert!(args.require_str("sheet").is_err());
    }

    #[test]
    fn test_int_accepts_strings_and_floats() {
        let v = json!({"a": 8, "b": "12", "c": 3.0, "d": 2.5, "e": "x"});
        let args = Args::new(&v);
        assert_eq!(args.int("a").unwrap(), Some(8));
        assert_eq!(args.int("b").unwrap(), Some(12));
        assert_eq!(args.int("c").unwrap(), Some(3));
        assert!(args.int("d").is_err());
        assert!(args.int("e").is_err());
        assert_eq!(args.int("missing").unwrap(), None);
    }

    #[test]
    fn test_grid_decodes_json_string() {
        let v = json!({"data": "[[\"a\", 1], [\"b\", 2]]"});
        let rows = Args::new(&v).grid("data").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], json!(2));
    }

    #[test]
    fn test_grid_rejects_scalar() {
        let v = json!({"data": 5});
        assert!(Args::new(&v).grid("data").is_err());
    }

    #[test]
    fn test_non_object_arguments() {
        let v = json!("not an object");
        let args = Args::new(&v);
        assert_eq!(args.str("cell"), None);
        assert!(!args.bool("bold"));
    }
}
