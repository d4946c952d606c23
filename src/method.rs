//! Inbound method calls: a method name plus a bag of arguments.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub trait MethodCall {
    fn method(&self) -> &str;

    fn argument(&self, key: &str) -> Option<&Value>;

    fn has_argument(&self, key: &str) -> bool {
        self.argument(key).is_some_and(|value| !value.is_null())
    }

    /// Strings come back as-is; any other non-null value is re-encoded as
    /// JSON, so payload arguments may be sent either as text or inline.
    fn string_argument(&self, key: &str) -> Option<String> {
        match self.argument(key)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    fn int_argument(&self, key: &str) -> Option<i64> {
        match self.argument(key)? {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonMethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl JsonMethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

impl MethodCall for JsonMethodCall {
    fn method(&self) -> &str {
        &self.method
    }

    fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }
}

#[cfg(test)]
#[path = "../tests/unit/method.rs"]
mod tests;
