//! Query parameter reading for list requests.

use std::collections::HashMap;

use crate::error::StoreError;
use crate::validator::Validator;

/// Raw query-string pairs, already percent-decoded by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or `default` when absent or empty.
    pub fn read_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => default.to_string(),
        }
    }

    /// Integer value for `key`, or `default` when absent or empty.
    ///
    /// An unparsable value records "must be an integer value" against `key`
    /// and yields `default`, so the remaining checks still run.
    pub fn read_int(&self, key: &str, default: i64, v: &mut Validator) -> i64 {
        let raw = match self.get(key) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return default,
        };
        match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                v.add_error(key, "must be an integer value");
                default
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parse a path id. Anything that is not a positive integer is `NotFound`.
pub fn parse_id(raw: &str) -> Result<i64, StoreError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(StoreError::NotFound),
    }
}
