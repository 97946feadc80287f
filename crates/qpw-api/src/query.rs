// Query parameters and URL composition.
//
// Parameters keep insertion order so the query string is deterministic;
// list values repeat their key once per element.

use indexmap::IndexMap;
use url::Url;

use crate::error::Error;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::One(v.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::One(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::One(v.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        Self::Many(v)
    }
}

impl From<&[&str]> for ParamValue {
    fn from(v: &[&str]) -> Self {
        Self::Many(v.iter().map(|s| (*s).to_owned()).collect())
    }
}

/// Ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(IndexMap<String, ParamValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Flattened `(key, value)` pairs in wire order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(k, v)| {
            let values: Vec<&str> = match v {
                ParamValue::One(s) => vec![s.as_str()],
                ParamValue::Many(items) => items.iter().map(String::as_str).collect(),
            };
            values.into_iter().map(move |value| (k.as_str(), value))
        })
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Compose `base` + `path` + encoded query string.
///
/// `path` is appended verbatim to the base origin (it is expected to
/// start with `/`). No `?` is emitted when `params` is empty.
pub fn build_url(base: &Url, path: &str, params: &QueryParams) -> Result<Url, Error> {
    let origin = base.as_str().trim_end_matches('/');
    let mut url = Url::parse(&format!("{origin}{path}"))?;

    if !params.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in params.pairs() {
            query.append_pair(key, value);
        }
    }

    Ok(url)
}

/// The API origin for a region, e.g. `https://api.mypurecloud.ie`.
pub fn regional_api_base(region: &str) -> Result<Url, Error> {
    Ok(Url::parse(&format!("https://api.{region}"))?)
}
