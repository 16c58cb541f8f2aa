//! URL parameters and their defaults.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parameters passed to `execute` and produced by translators.
///
/// Names matching a URL placeholder fill it in; the rest become query pairs.
pub type Params = BTreeMap<String, Value>;

/// Default parameters of an endpoint, by placeholder name.
pub type DefaultParams = BTreeMap<String, ParamDefault>;

/// Build [`Params`] from name/value pairs.
///
/// ```
/// use apiv7_core::params;
///
/// let p = params([("id", "abc")]);
/// assert_eq!(p["id"], "abc");
/// ```
pub fn params<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Params
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

/// Render a JSON value as the text that goes into a URL.
///
/// Strings are used verbatim, `null` becomes empty, everything else uses its
/// JSON representation.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn join_values(values: &[Value], separator: &str) -> String {
    values
        .iter()
        .map(render_value)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Default value of a URL parameter.
#[derive(Clone)]
pub enum ParamDefault {
    /// Fixed value. A string starting with `@` is read from the request body
    /// at that (dot separated) path.
    Value(Value),
    /// Computed each time a request is prepared.
    Resolver(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl ParamDefault {
    /// Create a default computed at request time.
    pub fn resolver(resolve: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self::Resolver(Arc::new(resolve))
    }

    /// Resolve against an optional request body.
    ///
    /// Returns `None` when an `@path` default has nothing to read from.
    #[must_use]
    pub fn resolve(&self, body: Option<&Value>) -> Option<Value> {
        match self {
            Self::Value(Value::String(text)) => match text.strip_prefix('@') {
                Some(path) => body.and_then(|body| lookup_path(body, path)).cloned(),
                None => Some(Value::String(text.clone())),
            },
            Self::Value(value) => Some(value.clone()),
            Self::Resolver(resolve) => Some(resolve()),
        }
    }
}

fn lookup_path<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(body, |current, segment| current.get(segment))
}

impl std::fmt::Debug for ParamDefault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

impl From<Value> for ParamDefault {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for ParamDefault {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for ParamDefault {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for ParamDefault {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for ParamDefault {
    fn from(value: bool) -> Self {
        Self::Value(Value::from(value))
    }
}

impl<'de> Deserialize<'de> for ParamDefault {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::Value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use serde_json::json;

    use super::*;

    #[test]
    fn render_values() {
        assert_eq!(render_value(&json!("abc")), "abc");
        assert_eq!(render_value(&json!(42)), "42");
        assert_eq!(render_value(&json!(false)), "false");
        assert_eq!(render_value(&Value::Null), "");
        assert_eq!(render_value(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn params_helper_converts_values() {
        let p = params([("id", json!("abc")), ("page", json!(2))]);
        assert_eq!(p.len(), 2);
        assert_eq!(p["page"], json!(2));
    }

    #[test]
    fn at_default_reads_body_path() {
        let default = ParamDefault::from("@owner.id");
        let body = json!({"owner": {"id": "u-1"}});
        assert_eq!(default.resolve(Some(&body)), Some(json!("u-1")));
        assert_eq!(default.resolve(None), None);
        assert_eq!(default.resolve(Some(&json!({}))), None);
    }

    #[test]
    fn plain_default_resolves_to_itself() {
        assert_eq!(ParamDefault::from(3_i64).resolve(None), Some(json!(3)));
    }

    #[test]
    fn resolver_is_called_each_time() {
        let counter = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&counter);
        let default = ParamDefault::resolver(move || json!(seen.fetch_add(1, Ordering::SeqCst)));

        assert_eq!(default.resolve(None), Some(json!(0)));
        assert_eq!(default.resolve(None), Some(json!(1)));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(format!("{default:?}"), "Resolver(..)");
    }

    #[test]
    fn deserializes_as_value() {
        let defaults: DefaultParams =
            serde_json::from_value(json!({"id": "@id", "lang": "en"})).expect("deserialize");
        assert!(matches!(&defaults["lang"], ParamDefault::Value(v) if v == "en"));
    }
}
