//! Payload Module
//!
//! Converts producer output to storable text and cached text back to values.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{MemoError, Result};

// == Cached Value ==
/// What a memoized call hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// Raw text, as stored
    Text(String),
    /// Parsed JSON document
    Json(Value),
}

impl CachedValue {
    /// Wraps producer output without going through storage.
    pub fn from_output<R: Serialize + ?Sized>(output: &R) -> Result<Self> {
        Ok(match serde_json::to_value(output)? {
            Value::String(text) => CachedValue::Text(text),
            other => CachedValue::Json(other),
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CachedValue::Text(text) => Some(text),
            CachedValue::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            CachedValue::Json(value) => Some(value),
            CachedValue::Text(_) => None,
        }
    }

    /// Text for `Text`, compact JSON for `Json`.
    pub fn into_text(self) -> String {
        match self {
            CachedValue::Text(text) => text,
            CachedValue::Json(value) => value.to_string(),
        }
    }

    /// Deserializes the value into `T`. Text is parsed as JSON first.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            CachedValue::Json(value) => Ok(serde_json::from_value(value)?),
            CachedValue::Text(text) => Ok(serde_json::from_str(&text)?),
        }
    }
}

// == Normalize ==
/// Turns producer output into the text written to storage.
///
/// Strings are stored verbatim, objects and arrays as compact JSON. Anything
/// else is rejected with [`MemoError::UnsupportedResultType`].
pub fn normalize<R: Serialize + ?Sized>(output: &R) -> Result<String> {
    match serde_json::to_value(output)? {
        Value::String(text) => Ok(text),
        value @ (Value::Object(_) | Value::Array(_)) => Ok(serde_json::to_string(&value)?),
        other => Err(MemoError::UnsupportedResultType(json_type_name(&other))),
    }
}

// == Decode ==
/// Parses stored text according to the `is_json` flag.
pub fn decode(path: &Path, text: String, is_json: bool) -> Result<CachedValue> {
    if !is_json {
        return Ok(CachedValue::Text(text));
    }

    serde_json::from_str(&text)
        .map(CachedValue::Json)
        .map_err(|source| MemoError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
