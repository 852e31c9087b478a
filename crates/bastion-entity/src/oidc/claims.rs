//! Claims asserted by an identity provider about an authenticated principal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed view over provider claims.
///
/// Claims have already passed signature and issuer validation upstream;
/// their contents are still untrusted input when rendered into roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(BTreeMap<String, Value>);

impl Claims {
    /// Empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a claim.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Raw claim value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Claim value if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Whether the claim equals `expected`, or is a list containing it.
    pub fn matches(&self, name: &str, expected: &str) -> bool {
        match self.get(name) {
            Some(Value::String(actual)) => actual == expected,
            Some(Value::Array(items)) => items.iter().any(|item| item.as_str() == Some(expected)),
            _ => false,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Claims {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
