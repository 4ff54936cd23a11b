//! API request/response models for authentication.
//!
//! Registration fields are all optional at the deserialization layer so that
//! a missing field surfaces as a field-level validation error rather than a
//! generic body rejection; [`RegisterRequest::validate`] turns the raw
//! request into a fully-checked [`Registration`].

use crate::api::models::users::{CurrentUser, UserResponse};
use crate::config::Config;
use crate::errors::{Error, FieldError, Result};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raw registration payload, JSON or multipart form fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
}

/// A registration that has passed field validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub address: Option<String>,
    pub state: String,
    pub city: String,
    pub country: String,
    pub pincode: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.') && !email.contains(char::is_whitespace)
}

pub(crate) fn is_digits(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit())
}

pub(crate) fn validate_name(name: &str, errors: &mut Vec<FieldError>) {
    let trimmed = name.trim();
    if trimmed.chars().count() < 3 {
        errors.push(FieldError::new("name", "Name must be at least 3 characters"));
    } else if !trimmed.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        errors.push(FieldError::new("name", "Name must contain only alphabets"));
    }
}

fn required<'a>(value: &'a Option<String>, field: &str, errors: &mut Vec<FieldError>) -> Option<&'a str> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Some(v),
        None => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
    }
}

impl RegisterRequest {
    /// Validate every field and produce a [`Registration`], or a
    /// [`Error::Validation`] carrying one entry per failed field.
    pub fn validate(self, config: &Config) -> Result<Registration> {
        let mut errors = Vec::new();

        if let Some(name) = required(&self.name, "name", &mut errors) {
            validate_name(name, &mut errors);
        }
        if let Some(email) = required(&self.email, "email", &mut errors)
            && !is_valid_email(email)
        {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }
        if let Some(phone) = required(&self.phone, "phone", &mut errors)
            && !is_digits(phone, 10, 15)
        {
            errors.push(FieldError::new("phone", "Phone must be 10-15 digits"));
        }

        // Password rules use the untrimmed value: whitespace is a valid character
        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => {
                let rules = &config.auth.password;
                if password.chars().count() < rules.min_length {
                    errors.push(FieldError::new(
                        "password",
                        format!("Password must be at least {} characters", rules.min_length),
                    ));
                } else if password.chars().count() > rules.max_length {
                    errors.push(FieldError::new(
                        "password",
                        format!("Password must be no more than {} characters", rules.max_length),
                    ));
                } else if !password.chars().any(|c| c.is_ascii_digit()) {
                    errors.push(FieldError::new("password", "Password must contain at least one number"));
                }
            }
            None => {
                errors.push(FieldError::new("password", "password is required"));
            }
        }

        required(&self.state, "state", &mut errors);
        required(&self.city, "city", &mut errors);
        required(&self.country, "country", &mut errors);
        if let Some(pincode) = required(&self.pincode, "pincode", &mut errors)
            && !is_digits(pincode, 4, 10)
        {
            errors.push(FieldError::new("pincode", "Pincode must be 4-10 digits"));
        }
        if let Some(address) = &self.address
            && address.chars().count() > 150
        {
            errors.push(FieldError::new("address", "Address must not exceed 150 characters"));
        }

        if !errors.is_empty() {
            return Err(Error::Validation { errors });
        }

        // The unwrap_or_default branches are unreachable: every required
        // field produced an error above if it was absent.
        Ok(Registration {
            name: self.name.unwrap_or_default().trim().to_string(),
            email: self.email.unwrap_or_default().trim().to_string(),
            phone: self.phone.unwrap_or_default().trim().to_string(),
            password: self.password.unwrap_or_default(),
            address: self.address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            state: self.state.unwrap_or_default().trim().to_string(),
            city: self.city.unwrap_or_default().trim().to_string(),
            country: self.country.unwrap_or_default().trim().to_string(),
            pincode: self.pincode.unwrap_or_default().trim().to_string(),
        })
    }
}

/// Login with email or phone plus password.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Registration/login payload: the created or authenticated user plus a
/// fresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthData {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh payload: a fresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenData {
    pub access_token: String,
    pub refresh_token: String,
}

/// `GET /api/auth/me` payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserData {
    pub user: CurrentUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            name: Some("Jane Doe".to_string()),
            email: Some("jane@example.com".to_string()),
            phone: Some("5551234567".to_string()),
            password: Some("abc123".to_string()),
            address: None,
            state: Some("California".to_string()),
            city: Some("Springfield".to_string()),
            country: Some("USA".to_string()),
            pincode: Some("90210".to_string()),
        }
    }

    fn field_errors(err: Error) -> Vec<String> {
        match err {
            Error::Validation { errors } => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_registration() {
        let registration = valid_request().validate(&Config::default()).unwrap();
        assert_eq!(registration.name, "Jane Doe");
        assert_eq!(registration.email, "jane@example.com");
    }

    #[test]
    fn test_missing_fields_reported_individually() {
        let fields = field_errors(RegisterRequest::default().validate(&Config::default()).unwrap_err());
        for expected in ["name", "email", "phone", "password", "state", "city", "country", "pincode"] {
            assert!(fields.contains(&expected.to_string()), "missing error for {expected}");
        }
    }

    #[test]
    fn test_name_rules() {
        let mut request = valid_request();
        request.name = Some("ab".to_string());
        assert_eq!(field_errors(request.validate(&Config::default()).unwrap_err()), vec!["name"]);

        let mut request = valid_request();
        request.name = Some("R2 D2".to_string());
        assert_eq!(field_errors(request.validate(&Config::default()).unwrap_err()), vec!["name"]);
    }

    #[test]
    fn test_password_rules() {
        let mut request = valid_request();
        request.password = Some("abc12".to_string()); // too short
        assert_eq!(field_errors(request.validate(&Config::default()).unwrap_err()), vec!["password"]);

        let mut request = valid_request();
        request.password = Some("abcdef".to_string()); // no digit
        assert_eq!(field_errors(request.validate(&Config::default()).unwrap_err()), vec!["password"]);
    }

    #[test]
    fn test_phone_and_pincode_rules() {
        let mut request = valid_request();
        request.phone = Some("123".to_string());
        request.pincode = Some("12".to_string());
        let fields = field_errors(request.validate(&Config::default()).unwrap_err());
        assert!(fields.contains(&"phone".to_string()));
        assert!(fields.contains(&"pincode".to_string()));
    }

    #[test]
    fn test_email_rules() {
        for bad in ["plainaddress", "no domain@x", "user@nodot", "user@.com", ""] {
            let mut request = valid_request();
            request.email = Some(bad.to_string());
            let fields = field_errors(request.validate(&Config::default()).unwrap_err());
            assert!(fields.contains(&"email".to_string()), "accepted invalid email {bad:?}");
        }

        assert!(is_valid_email("user.name@domain.co.uk"));
        assert!(is_valid_email("test+tag@gmail.com"));
    }

    #[test]
    fn test_address_length_rule() {
        let mut request = valid_request();
        request.address = Some("x".repeat(151));
        assert_eq!(field_errors(request.validate(&Config::default()).unwrap_err()), vec!["address"]);
    }
}
