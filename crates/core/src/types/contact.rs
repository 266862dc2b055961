//! Fixed-width numeric fields of the address and sign-up forms.
//!
//! Both types trim their input and then require an exact count of ASCII
//! digits. Validation happens before any request is built, so a value of
//! these types is always safe to send.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors for [`ContactNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactNumberError {
    #[error("Contact number is required")]
    Empty,
    #[error("Contact number must be {} digits", ContactNumber::DIGITS)]
    InvalidFormat,
}

/// Errors for [`Zipcode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ZipcodeError {
    #[error("Zipcode is required")]
    Empty,
    #[error("Zipcode must be {} digits", Zipcode::DIGITS)]
    InvalidFormat,
}

fn is_digits(s: &str, count: usize) -> bool {
    s.len() == count && s.bytes().all(|b| b.is_ascii_digit())
}

/// A phone number of exactly ten digits.
///
/// ```
/// use eshop_core::ContactNumber;
///
/// assert!(ContactNumber::parse("9999999999").is_ok());
/// assert!(ContactNumber::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactNumber(String);

impl ContactNumber {
    /// Required number of digits.
    pub const DIGITS: usize = 10;

    /// Parse a contact number from form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or is not exactly ten
    /// ASCII digits.
    pub fn parse(s: &str) -> Result<Self, ContactNumberError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactNumberError::Empty);
        }
        if !is_digits(s, Self::DIGITS) {
            return Err(ContactNumberError::InvalidFormat);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A postal code of exactly six digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zipcode(String);

impl Zipcode {
    /// Required number of digits.
    pub const DIGITS: usize = 6;

    /// Parse a zipcode from form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or is not exactly six
    /// ASCII digits.
    pub fn parse(s: &str) -> Result<Self, ZipcodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ZipcodeError::Empty);
        }
        if !is_digits(s, Self::DIGITS) {
            return Err(ZipcodeError::InvalidFormat);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Zipcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_number_exact_length() {
        assert!(ContactNumber::parse("9999999999").is_ok());
        assert!(ContactNumber::parse(" 9999999999 ").is_ok());
        assert_eq!(
            ContactNumber::parse("12345"),
            Err(ContactNumberError::InvalidFormat)
        );
        assert_eq!(
            ContactNumber::parse("99999999999"),
            Err(ContactNumberError::InvalidFormat)
        );
    }

    #[test]
    fn test_contact_number_rejects_non_digits() {
        assert_eq!(
            ContactNumber::parse("99999-9999"),
            Err(ContactNumberError::InvalidFormat)
        );
        assert_eq!(
            ContactNumber::parse("٩٩٩٩٩٩٩٩٩٩"),
            Err(ContactNumberError::InvalidFormat)
        );
    }

    #[test]
    fn test_contact_number_empty() {
        assert_eq!(ContactNumber::parse(""), Err(ContactNumberError::Empty));
    }

    #[test]
    fn test_zipcode_exact_length() {
        assert!(Zipcode::parse("123456").is_ok());
        assert_eq!(Zipcode::parse("12345"), Err(ZipcodeError::InvalidFormat));
        assert_eq!(Zipcode::parse("1234567"), Err(ZipcodeError::InvalidFormat));
        assert_eq!(Zipcode::parse("12a456"), Err(ZipcodeError::InvalidFormat));
        assert_eq!(Zipcode::parse(" "), Err(ZipcodeError::Empty));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ContactNumberError::InvalidFormat.to_string(),
            "Contact number must be 10 digits"
        );
        assert_eq!(
            ZipcodeError::InvalidFormat.to_string(),
            "Zipcode must be 6 digits"
        );
    }
}
