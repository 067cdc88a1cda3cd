//! Read-only view over a raw webhook payload.
//!
//! Paths are dotted (`comment.user.login`); numeric segments index into
//! arrays (`branches.0.name`). A JSON `null` is treated the same as an
//! absent key, which is how GitHub encodes most "not applicable" fields.

use serde_json::Value;

use herald_common::error::RelayError;

#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    root: Value,
}

impl Payload {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse a request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, RelayError> {
        serde_json::from_slice(body)
            .map(Self::new)
            .map_err(|e| RelayError::InvalidPayload(e.to_string()))
    }

    /// Optional lookup. `None` when any segment of the path is missing.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        (!current.is_null()).then_some(current)
    }

    /// Required lookup. Fails with [`RelayError::FieldMissing`] naming the
    /// full path.
    pub fn require(&self, path: &str) -> Result<&Value, RelayError> {
        self.get(path).ok_or_else(|| RelayError::field_missing(path))
    }

    pub fn str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn require_str(&self, path: &str) -> Result<&str, RelayError> {
        self.str(path).ok_or_else(|| RelayError::field_missing(path))
    }

    /// Scalar rendered as text: strings verbatim, numbers and booleans via
    /// their JSON form. Containers yield `None`.
    pub fn display(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn require_display(&self, path: &str) -> Result<String, RelayError> {
        self.display(path).ok_or_else(|| RelayError::field_missing(path))
    }

    /// Items of an array field; empty when absent.
    pub fn items(&self, path: &str) -> &[Value] {
        self.get(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl From<Value> for Payload {
    fn from(root: Value) -> Self {
        Payload::new(root)
    }
}
