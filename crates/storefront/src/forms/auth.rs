use secrecy::SecretString;

use eshop_core::{ContactNumber, ContactNumberError, Email, SignupRequest};

use super::ValidationErrors;

/// Validated sign-in input.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecretString,
}

/// Sign-in form.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    /// Both fields are required.
    ///
    /// # Errors
    ///
    /// Returns an error for each empty field.
    pub fn validate(&self) -> Result<LoginRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", "Email is required");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result(|| LoginRequest {
            username: username.to_string(),
            password: SecretString::from(self.password.clone()),
        })
    }
}

/// Sign-up form. Only the first failing rule is reported.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub contact_number: String,
}

impl SignupForm {
    /// Check the rules in order: passwords match, first name, last name,
    /// email, password, contact number present, contact number 10 digits.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule as a single-entry [`ValidationErrors`].
    pub fn validate(&self) -> Result<SignupRequest, ValidationErrors> {
        let fail = |field: &'static str, message: String| {
            let mut errors = ValidationErrors::new();
            errors.add(field, message);
            errors
        };

        if self.password != self.confirm_password {
            return Err(fail("confirmPassword", "Passwords do not match".to_string()));
        }
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err(fail("firstName", "First Name is required".to_string()));
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            return Err(fail("lastName", "Last Name is required".to_string()));
        }
        let email = Email::parse(&self.email).map_err(|e| fail("email", e.to_string()))?;
        if self.password.is_empty() {
            return Err(fail("password", "Password is required".to_string()));
        }
        let contact_number = ContactNumber::parse(&self.contact_number).map_err(|e| match e {
            ContactNumberError::Empty => {
                fail("contactNumber", "Contact Number is required".to_string())
            }
            ContactNumberError::InvalidFormat => fail(
                "contactNumber",
                format!("Contact Number must be {} digits", ContactNumber::DIGITS),
            ),
        })?;

        Ok(SignupRequest {
            email,
            password: self.password.clone(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            contact_number,
        })
    }
}
