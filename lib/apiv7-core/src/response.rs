//! Responses returned by transports.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result, UrlTemplate};

/// Buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: BTreeMap<String, String>,
    body: Bytes,
}

impl Response {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error, with the failing path, if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        from_json(&self.body)
    }

    /// Body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> std::result::Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Replace the body with the value found under `key` of the JSON object.
    ///
    /// Bodies that are empty, not JSON objects, or lack the key are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the unwrapped value cannot be re-serialized.
    pub fn unwrap_envelope(mut self, key: &str) -> Result<Self> {
        if let Ok(Value::Object(mut object)) = serde_json::from_slice::<Value>(&self.body)
            && let Some(inner) = object.remove(key)
        {
            self.body = Bytes::from(serde_json::to_vec(&inner)?);
        }
        Ok(self)
    }

    /// Check that an array action received a JSON array.
    ///
    /// Other actions and empty bodies are accepted as they are, whatever the
    /// body holds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if an array was expected and the body
    /// is some other JSON value.
    pub fn check_shape(&self, action: &str, expects_array: bool) -> Result<()> {
        if !expects_array || self.body.is_empty() {
            return Ok(());
        }
        let value: Value = from_json(&self.body)?;
        if value.is_array() {
            return Ok(());
        }
        Err(Error::ShapeMismatch {
            action: action.to_string(),
            expected: "an array",
            actual: shape_of(&value),
        })
    }

    /// Items of an aggregated response, failed ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a JSON array of items.
    pub fn aggregated_items(&self) -> Result<Vec<AggregatedItem>> {
        if self.body.is_empty() {
            return Ok(Vec::new());
        }
        from_json(&self.body)
    }

    /// Replace an aggregated body with the plain list of its values.
    ///
    /// `template` is the URL the call was wildcarded from. Object values get
    /// the placeholder values recovered from their item's `path`, unless they
    /// already carry those fields. Failed items are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a JSON array of items.
    pub fn aggregated(mut self, template: &UrlTemplate) -> Result<Self> {
        if self.body.is_empty() {
            return Ok(self);
        }
        let values = self
            .aggregated_items()?
            .into_iter()
            .filter_map(|item| item.into_value(template))
            .collect::<Vec<_>>();
        self.body = Bytes::from(serde_json::to_vec(&values)?);
        Ok(self)
    }
}

/// One entry of an aggregated response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedItem {
    /// Concrete path the value was read from.
    pub path: String,
    /// Value of the wildcarded parameter, as reported by the API.
    #[serde(default)]
    pub key: Value,
    /// Payload for this path.
    #[serde(default)]
    pub value: Value,
    /// Failure reported for this path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl AggregatedItem {
    /// The value, enriched with the placeholders of `template` read from the
    /// path, or `None` when the item failed.
    #[must_use]
    pub fn into_value(self, template: &UrlTemplate) -> Option<Value> {
        if let Some(error) = &self.error {
            tracing::warn!(path = %self.path, %error, "aggregated item failed");
            return None;
        }
        let mut value = self.value;
        if let Value::Object(object) = &mut value {
            for (name, captured) in template.capture(&self.path).unwrap_or_default() {
                object.entry(name).or_insert(Value::String(captured));
            }
        }
        Some(value)
    }
}

const fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
    }
}

/// Deserialize JSON bytes with path-aware error messages.
///
/// # Errors
///
/// Returns [`Error::JsonDeserialization`] naming the path of the field that
/// failed (e.g., `items[2].name`).
///
/// # Example
///
/// ```
/// use apiv7_core::from_json;
///
/// let ids: Vec<u64> = from_json(b"[1,2,3]").expect("deserialize");
/// assert_eq!(ids, vec![1, 2, 3]);
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| Error::JsonDeserialization {
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })
}
