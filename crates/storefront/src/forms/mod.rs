//! Form models with client-side validation.
//!
//! Forms hold the raw text the user typed. `validate()` turns that text into
//! the typed request body, or into [`ValidationErrors`] keyed by field. A form
//! that fails validation never reaches the network.

mod address;
mod auth;
mod product;

pub use address::AddressForm;
pub use auth::{LoginForm, SignupForm};
pub use product::ProductForm;

use std::collections::BTreeMap;
use std::fmt;

/// Field-level validation failures, keyed by wire field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first error recorded for a field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    /// Error for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(value)` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in self.fields.values() {
            if !first {
                f.write_str("\n")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Trimmed value, or a "{label} is required" error.
fn required<'a>(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &'a str,
) -> &'a str {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, format!("{label} is required"));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("zipcode", "Zipcode is required");
        errors.add("zipcode", "Zipcode must be 6 digits");
        errors.add("name", "Name is required");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("zipcode"), Some("Zipcode is required"));
        assert_eq!(errors.to_string(), "Name is required\nZipcode is required");
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(|| 7), Ok(7));

        let mut errors = ValidationErrors::new();
        errors.add("name", "Name is required");
        assert!(errors.into_result(|| 7).is_err());
    }
}
