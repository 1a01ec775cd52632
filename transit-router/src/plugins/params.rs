//! Validated plugin parameters.

use std::collections::BTreeMap;

use serde_json::Value;

use super::PluginError;

/// Longest accepted string parameter, in bytes.
pub const MAX_PARAM_LEN: usize = 256;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Flag(bool),
}

/// Flat key/value parameters handed to a plugin constructor.
///
/// # Invariants
///
/// - Values are either strings of at most [`MAX_PARAM_LEN`] bytes or
///   booleans. Anything else is rejected by [`PluginParams::from_json`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginParams {
    values: BTreeMap<String, ParamValue>,
}

impl PluginParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), ParamValue::Text(value.into()));
        self
    }

    pub fn with_flag(mut self, key: impl Into<String>, value: bool) -> Self {
        self.values.insert(key.into(), ParamValue::Flag(value));
        self
    }

    /// Validates a JSON object of parameters.
    ///
    /// `null` yields empty parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidParams`] for a non-object, a nested or
    /// numeric value, or an over-long string.
    pub fn from_json(value: &Value) -> Result<Self, PluginError> {
        let object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            other => {
                return Err(PluginError::InvalidParams(format!(
                    "expected an object, got {other}"
                )));
            }
        };

        let mut values = BTreeMap::new();
        for (key, value) in object {
            let value = match value {
                Value::String(s) if s.len() <= MAX_PARAM_LEN => ParamValue::Text(s.clone()),
                Value::String(s) => {
                    return Err(PluginError::InvalidParams(format!(
                        "{key}: string of {} bytes exceeds {MAX_PARAM_LEN}",
                        s.len()
                    )));
                }
                Value::Bool(b) => ParamValue::Flag(*b),
                _ => {
                    return Err(PluginError::InvalidParams(format!(
                        "{key}: only strings and booleans are allowed"
                    )));
                }
            };
            values.insert(key.clone(), value);
        }

        Ok(Self { values })
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ParamValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(ParamValue::Flag(b)) => Some(*b),
            _ => None,
        }
    }

    /// A required, non-empty string parameter.
    pub fn require_text(&self, key: &'static str) -> Result<&str, PluginError> {
        self.text(key)
            .filter(|s| !s.is_empty())
            .ok_or(PluginError::MissingParam(key))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
