use eshop_core::{ContactNumber, NewAddress, Zipcode};

use super::{ValidationErrors, required};

/// New-address sub-form of the checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressForm {
    pub name: String,
    pub contact_number: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub landmark: String,
}

impl AddressForm {
    /// Validate every field and build the request body.
    ///
    /// # Errors
    ///
    /// Returns one error per failing field: missing required values, a
    /// contact number that is not exactly 10 digits, a zipcode that is not
    /// exactly 6 digits.
    pub fn validate(&self) -> Result<NewAddress, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required(&mut errors, "name", "Name", &self.name);
        let contact_number = ContactNumber::parse(&self.contact_number)
            .map_err(|e| errors.add("contactNumber", e.to_string()))
            .ok();
        let street = required(&mut errors, "street", "Street", &self.street);
        let city = required(&mut errors, "city", "City", &self.city);
        let state = required(&mut errors, "state", "State", &self.state);
        let zipcode = Zipcode::parse(&self.zipcode)
            .map_err(|e| errors.add("zipcode", e.to_string()))
            .ok();

        match (contact_number, zipcode) {
            (Some(contact_number), Some(zipcode)) if errors.is_empty() => Ok(NewAddress {
                name: name.to_string(),
                contact_number,
                street: street.to_string(),
                city: city.to_string(),
                state: state.to_string(),
                zipcode,
                landmark: self.landmark.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> AddressForm {
        AddressForm {
            name: "A".to_string(),
            contact_number: "9999999999".to_string(),
            street: "S".to_string(),
            city: "C".to_string(),
            state: "ST".to_string(),
            zipcode: "123456".to_string(),
            landmark: String::new(),
        }
    }

    #[test]
    fn test_valid_form_builds_request() {
        let address = valid().validate().unwrap();
        assert_eq!(address.name, "A");
        assert_eq!(address.contact_number.as_str(), "9999999999");
        assert_eq!(address.zipcode.as_str(), "123456");
    }

    #[test]
    fn test_short_contact_number_is_a_field_error() {
        let form = AddressForm {
            contact_number: "12345".to_string(),
            ..valid()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("contactNumber"),
            Some("Contact number must be 10 digits")
        );
    }

    #[test]
    fn test_zipcode_must_be_six_digits() {
        for zipcode in ["12345", "1234567", "12a456"] {
            let form = AddressForm {
                zipcode: zipcode.to_string(),
                ..valid()
            };
            let errors = form.validate().unwrap_err();
            assert_eq!(errors.get("zipcode"), Some("Zipcode must be 6 digits"));
        }
    }

    #[test]
    fn test_empty_form_reports_every_required_field() {
        let errors = AddressForm::default().validate().unwrap_err();
        for field in ["name", "contactNumber", "street", "city", "state", "zipcode"] {
            assert!(errors.get(field).is_some(), "missing error for {field}");
        }
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert!(errors.get("landmark").is_none());
    }

    #[test]
    fn test_values_are_trimmed() {
        let form = AddressForm {
            name: "  A ".to_string(),
            contact_number: " 9999999999 ".to_string(),
            ..valid()
        };
        let address = form.validate().unwrap();
        assert_eq!(address.name, "A");
        assert_eq!(address.contact_number.as_str(), "9999999999");
    }
}
