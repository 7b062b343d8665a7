// ✅ Validation - Field checks applied at registration time
//
// Everything that ends up in a flat file goes through here first, so a
// record can never smuggle the `|` delimiter or a line break into storage.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid name '{0}': 2-20 letters and spaces only")]
    Name(String),

    #[error("invalid phone number '{0}': must be exactly 11 digits starting with '01'")]
    Phone(String),

    #[error("invalid email '{0}'")]
    Email(String),

    #[error("password must be at least {min} characters long")]
    Password { min: usize },

    #[error("invalid license plate '{0}': expected ABC-1234 or an 8-character plate")]
    LicensePlate(String),

    #[error("invalid vehicle type '{0}': 1-20 characters, no '|'")]
    VehicleType(String),
}

pub const MIN_PASSWORD_LEN: usize = 8;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
    })
}

fn plate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]{1,3}-[0-9]{1,4}$").expect("valid plate regex"))
}

fn free_plate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9\-]{8}$").expect("valid plate regex"))
}

/// Trim surrounding spaces the way interactive input arrives.
pub fn normalize(input: &str) -> String {
    input.trim().to_string()
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    let letters_only = name.chars().all(|c| c.is_alphabetic() || c == ' ');
    if !(2..=20).contains(&len) || !letters_only || name.trim().is_empty() {
        return Err(ValidationError::Name(name.to_string()));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let ok = phone.len() == 11
        && phone.starts_with("01")
        && phone.chars().all(|c| c.is_ascii_digit());
    if !ok {
        return Err(ValidationError::Phone(phone.to_string()));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !(5..=50).contains(&email.len()) || !email_pattern().is_match(email) {
        return Err(ValidationError::Email(email.to_string()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::Password {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

pub fn validate_license_plate(plate: &str) -> Result<(), ValidationError> {
    if plate_pattern().is_match(plate) || free_plate_pattern().is_match(plate) {
        Ok(())
    } else {
        Err(ValidationError::LicensePlate(plate.to_string()))
    }
}

pub fn validate_vehicle_type(vehicle_type: &str) -> Result<(), ValidationError> {
    let len = vehicle_type.chars().count();
    let clean = !vehicle_type.contains(['|', '\n', '\r']);
    if !(1..=20).contains(&len) || !clean {
        return Err(ValidationError::VehicleType(vehicle_type.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert!(validate_name("Rahim Uddin").is_ok());
        assert!(validate_name("Al").is_ok());
        assert!(validate_name("A").is_err());
        assert!(validate_name("John3").is_err());
        assert!(validate_name("a name that is far too long").is_err());
        assert!(validate_name("  ").is_err());
    }

    #[test]
    fn test_phones() {
        assert!(validate_phone("01712345678").is_ok());
        assert!(validate_phone("0171234567").is_err()); // 10 digits
        assert!(validate_phone("02712345678").is_err()); // wrong prefix
        assert!(validate_phone("0171234567a").is_err());
    }

    #[test]
    fn test_emails() {
        assert!(validate_email("admin@gmail.com").is_ok());
        assert!(validate_email("ops.lead@lot.example.org").is_ok());
        assert!(validate_email("admin@").is_err());
        assert!(validate_email("a|b@gmail.com").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_passwords() {
        assert!(validate_password("hunter22").is_ok());
        assert_eq!(
            validate_password("short"),
            Err(ValidationError::Password { min: 8 })
        );
    }

    #[test]
    fn test_license_plates() {
        assert!(validate_license_plate("ABC-1234").is_ok());
        assert!(validate_license_plate("DH-12").is_ok());
        assert!(validate_license_plate("DHK12345").is_ok()); // free 8-char form
        assert!(validate_license_plate("abc-1234").is_err());
        assert!(validate_license_plate("ABCD-12345").is_err());
        assert!(validate_license_plate("AB|12345").is_err());
    }

    #[test]
    fn test_vehicle_types() {
        assert!(validate_vehicle_type("Car").is_ok());
        assert!(validate_vehicle_type("").is_err());
        assert!(validate_vehicle_type("Car|Bike").is_err());
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize("  Karim  "), "Karim");
    }
}
