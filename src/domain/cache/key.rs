//! Cache key generation strategies

use std::collections::BTreeMap;
use std::fmt::{self, Debug};

use xxhash_rust::xxh3::xxh3_128;

/// A scalar parameter value as it appears in a cache key
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", escape_value(s)),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Escapes the separator characters so a value can never forge another pair
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            other => out.push(other),
        }
    }

    out
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Parameters for cache key generation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheKeyParams {
    /// Endpoint the parameters belong to (e.g. "products")
    pub endpoint: String,
    /// Present parameters, ordered by name
    pub components: BTreeMap<String, ParamValue>,
}

impl CacheKeyParams {
    /// Creates new cache key parameters for an endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            components: BTreeMap::new(),
        }
    }

    /// Adds a component to the key parameters
    pub fn with_component(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.components.insert(key.into(), value.into());
        self
    }

    /// Adds a component only when a value is present.
    ///
    /// An absent value leaves the parameters untouched, so it encodes exactly
    /// like a parameter that was never specified.
    pub fn with_optional<V>(self, key: impl Into<String>, value: Option<V>) -> Self
    where
        V: Into<ParamValue>,
    {
        match value {
            Some(v) => self.with_component(key, v),
            None => self,
        }
    }

    /// Canonical pre-hash form: `endpoint?k1=v1&k2=v2` with keys ascending
    pub fn canonical(&self) -> String {
        let query = self
            .components
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.endpoint, query)
    }
}

/// Trait for generating cache keys from input data
pub trait CacheKeyGenerator: Send + Sync + Debug {
    /// Generates a cache key from the given components
    fn generate(&self, params: &CacheKeyParams) -> String;
}

/// Key encoder producing a fixed-length 128-bit digest of the canonical form
///
/// The output is always 32 lowercase hex characters. Only the endpoint and
/// the present parameters feed the hash; nothing time- or locale-dependent.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryKeyEncoder;

impl QueryKeyEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl CacheKeyGenerator for QueryKeyEncoder {
    fn generate(&self, params: &CacheKeyParams) -> String {
        format!("{:032x}", xxh3_128(params.canonical().as_bytes()))
    }
}
