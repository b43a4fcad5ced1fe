use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use url::form_urlencoded;

use crate::DescriptorError;

/// Multi-value query/form parameter container.
///
/// Keys are kept sorted so encoding is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryValues(BTreeMap<String, Vec<String>>);

impl QueryValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes an `application/x-www-form-urlencoded` string.
    pub fn parse(query: &str) -> Self {
        let mut values = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            values.add(key, value);
        }
        values
    }

    /// Replaces every value stored under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), vec![value.into()]);
    }

    /// Appends a value under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Returns the first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.first().map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |value| (key.as_str(), value.as_str())))
    }

    /// Encodes as `application/x-www-form-urlencoded`, keys in sorted order.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    pub(crate) fn merge_set(&mut self, other: QueryValues) {
        for (key, values) in other.0 {
            self.0.insert(key, values);
        }
    }

    pub(crate) fn merge_add(&mut self, other: QueryValues) {
        for (key, values) in other.0 {
            self.0.entry(key).or_default().extend(values);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.add(key, value);
        }
        values
    }
}

/// Query or form payload accepted by the descriptor and the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum Params {
    /// String keys mapped to single string values.
    Strings(BTreeMap<String, String>),
    /// Generic JSON value; must be an object whose values are stringified.
    Values(Value),
    /// Multi-value container.
    Multi(QueryValues),
    /// Already encoded query string such as `a=1&b=2`.
    Raw(String),
}

impl Params {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Strings(map) => map.is_empty(),
            Self::Values(Value::Object(map)) => map.is_empty(),
            Self::Values(Value::Null) => true,
            Self::Values(_) => false,
            Self::Multi(values) => values.is_empty(),
            Self::Raw(raw) => raw.trim_start_matches('?').is_empty(),
        }
    }

    /// Flattens the payload into query values.
    ///
    /// Generic values must be a JSON object of scalars or arrays of scalars.
    pub fn to_query_values(&self) -> Result<QueryValues, DescriptorError> {
        match self {
            Self::Strings(map) => Ok(map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()),
            Self::Multi(values) => Ok(values.clone()),
            Self::Raw(raw) => Ok(QueryValues::parse(raw.trim_start_matches('?'))),
            Self::Values(Value::Null) => Ok(QueryValues::new()),
            Self::Values(Value::Object(map)) => {
                let mut values = QueryValues::new();
                for (key, value) in map {
                    match value {
                        // An empty array contributes nothing, so it never
                        // replaces existing values under the same key.
                        Value::Array(items) => {
                            for item in items {
                                values.add(key.as_str(), stringify_scalar(key, item)?);
                            }
                        }
                        other => values.add(key.as_str(), stringify_scalar(key, other)?),
                    }
                }
                Ok(values)
            }
            Self::Values(other) => Err(DescriptorError::UnsupportedPayload {
                reason: format!("expected a JSON object, got {}", json_kind(other)),
            }),
        }
    }
}

fn stringify_scalar(key: &str, value: &Value) -> Result<String, DescriptorError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text.clone()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Number(number) => Ok(number.to_string()),
        nested => Err(DescriptorError::UnsupportedParameter {
            key: key.to_owned(),
            reason: format!("nested {} cannot be stringified", json_kind(nested)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::Strings(BTreeMap::new())
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<BTreeMap<String, String>> for Params {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::Strings(map)
    }
}

impl From<HashMap<String, String>> for Params {
    fn from(map: HashMap<String, String>) -> Self {
        Self::Strings(map.into_iter().collect())
    }
}

impl From<HashMap<&str, &str>> for Params {
    fn from(map: HashMap<&str, &str>) -> Self {
        Self::Strings(
            map.into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        )
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Params {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self::Strings(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        )
    }
}

impl From<Vec<(String, String)>> for Params {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Strings(pairs.into_iter().collect())
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        Self::Values(value)
    }
}

impl From<serde_json::Map<String, Value>> for Params {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self::Values(Value::Object(map))
    }
}

impl From<QueryValues> for Params {
    fn from(values: QueryValues) -> Self {
        Self::Multi(values)
    }
}

impl From<&str> for Params {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_owned())
    }
}

impl From<String> for Params {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}
