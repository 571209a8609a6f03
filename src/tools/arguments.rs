//! Typed access to parsed tool call arguments.

use serde_json::Value;

use crate::error::ChatError;

/// Parsed arguments handed to [`ToolFunction::run`](super::ToolFunction::run).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Parse the raw `arguments_json` of a tool call.
    ///
    /// Blank input is treated as an empty object; models emit it for tools
    /// without parameters.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::new(Value::Object(Default::default())));
        }
        serde_json::from_str(raw).map(Self::new)
    }

    pub fn raw(&self) -> &Value {
        &self.value
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ChatError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChatError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, ChatError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ChatError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, ChatError> {
        self.value
            .get(key)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ChatError::InvalidArgument(format!("Missing number argument: {key}")))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ChatError> {
        self.value
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| ChatError::InvalidArgument(format!("Missing boolean argument: {key}")))
    }

    pub fn get_array(&self, key: &str) -> Result<&Vec<Value>, ChatError> {
        self.value
            .get(key)
            .and_then(|v| v.as_array())
            .ok_or_else(|| ChatError::InvalidArgument(format!("Missing array argument: {key}")))
    }

    /// Deserialize all arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, ChatError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            ChatError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
