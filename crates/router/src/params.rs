//! Typed route parameters.
//!
//! Captured path and domain values are coerced to numbers when the conversion is
//! lossless, so parameters are stored as [`serde_json::Value`]s rather than raw strings.

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

/// Parameters bound from a matched request, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    inner: Map<String, Value>,
}

impl Params {
    /// Creates an empty parameter set
    #[inline]
    pub fn empty() -> Self {
        Self { inner: Map::new() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Gets the value of a parameter by its name
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Value> {
        self.inner.get(key.as_ref())
    }

    /// Returns true if the key is present, even when its value is `null`
    #[inline]
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    /// Gets a parameter deserialized into `T`, `None` when absent or of another shape
    pub fn get_as<T: DeserializeOwned>(&self, key: impl AsRef<str>) -> Option<T> {
        self.get(key).and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Deserializes the whole parameter set into `T`
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.inner.clone()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Value> {
        self.inner.remove(key.as_ref())
    }

    /// Inserts `value` only when `key` is absent; present keys are never overwritten.
    pub fn insert_absent(&mut self, key: impl Into<String>, value: Value) {
        self.inner.entry(key.into()).or_insert(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.inner.iter()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.inner
    }
}

impl From<Map<String, Value>> for Params {
    fn from(inner: Map<String, Value>) -> Self {
        Self { inner }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self { inner: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

/// Turns a captured string into a number when the round trip is lossless.
///
/// `"42"` becomes `42` and `"1.5"` becomes `1.5`, while `"042"`, `"1e3"` or `"1.50"`
/// stay strings because formatting the number back would not give the same text.
pub fn coerce(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>()
        && int.to_string() == raw
    {
        return Value::Number(int.into());
    }

    if let Ok(float) = raw.parse::<f64>()
        && float.is_finite()
        && float.to_string() == raw
        && let Some(number) = Number::from_f64(float)
    {
        return Value::Number(number);
    }

    Value::String(raw.to_owned())
}

/// Renders a parameter value as it appears inside a URL, `None` for `null`.
pub fn to_url_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
