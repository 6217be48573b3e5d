//! Validator - Accumulates field-level validation errors.
//!
//! One validator is created per request, fed every check, and then either
//! turned into `Ok(())` or a `StoreError::ValidationFailed` carrying all the
//! failures at once.
//!
//! ## Example
//!
//! ```ignore
//! let mut v = Validator::new();
//! v.check(!input.discipline.is_empty(), "discipline", "must be provided");
//! v.check(input.time_period <= 6, "time_period", "must not be more than 6");
//! v.into_result()?;
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::StoreError;

/// Field name → first error message recorded for that field.
///
/// Ordered so the rendered message and JSON body are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    /// Message recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Accumulator of named field errors. Not shared between threads.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no check has failed.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record `message` for `field` unless the field already has an error.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .0
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record `message` for `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    /// Consume the validator, failing with every recorded error.
    pub fn into_result(self) -> Result<(), StoreError> {
        if self.valid() {
            Ok(())
        } else {
            Err(StoreError::ValidationFailed(self.errors))
        }
    }
}

/// True if `value` is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validator_is_valid() {
        let v = Validator::new();
        assert!(v.valid());
        assert!(v.into_result().is_ok());
    }

    #[test]
    fn failed_check_records_error() {
        let mut v = Validator::new();
        v.check(false, "page", "must be greater than zero");
        v.check(true, "page_size", "must be a maximum of 100");

        assert!(!v.valid());
        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.errors().get("page"), Some("must be greater than zero"));
        assert!(!v.errors().contains("page_size"));
    }

    #[test]
    fn first_error_per_field_wins() {
        let mut v = Validator::new();
        v.check(false, "discipline", "must be provided");
        v.check(false, "discipline", "must not be more than 100 bytes long");

        assert_eq!(v.errors().get("discipline"), Some("must be provided"));
    }

    #[test]
    fn into_result_carries_all_errors() {
        let mut v = Validator::new();
        v.add_error("sort", "invalid sort value");
        v.add_error("page", "must be greater than zero");

        match v.into_result() {
            Err(StoreError::ValidationFailed(errors)) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(
                    errors.to_string(),
                    "page: must be greater than zero; sort: invalid sort value"
                );
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn errors_serialize_as_object() {
        let mut v = Validator::new();
        v.add_error("page_size", "must be a maximum of 100");
        let json = serde_json::to_value(v.errors()).unwrap();
        assert_eq!(json, serde_json::json!({ "page_size": "must be a maximum of 100" }));
    }

    #[test]
    fn permitted_value_membership() {
        assert!(permitted_value(&"id", &["id", "discipline"]));
        assert!(!permitted_value(&"cabinet", &["id", "discipline"]));
    }
}
