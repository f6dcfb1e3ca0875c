use crate::errors::{AppError, Result};
use regex::Regex;

pub struct Validator;

impl Validator {
    pub fn validate_email(email: &str) -> Result<()> {
        let email_regex = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .map_err(|e| AppError::InternalError(format!("Regex error: {}", e)))?;

        if !email_regex.is_match(email) {
            return Err(AppError::ValidationError("Invalid email format".to_string()));
        }

        if email.len() > 254 {
            return Err(AppError::ValidationError("Email too long".to_string()));
        }

        Ok(())
    }

    pub fn validate_password(password: &str) -> Result<()> {
        if password.len() < 6 {
            return Err(AppError::ValidationError(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        if password.len() > 128 {
            return Err(AppError::ValidationError(
                "Password must be less than 128 characters".to_string(),
            ));
        }

        Ok(())
    }

    pub fn validate_full_name(full_name: &str) -> Result<()> {
        if full_name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Full name is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_otp(otp: &str) -> Result<()> {
        if otp.len() != 6 || !otp.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::ValidationError(
                "OTP must be 6 digits".to_string(),
            ));
        }
        Ok(())
    }
}

/// Normalize user-entered phone numbers. Strips formatting characters and
/// prefixes +91 when no country code was given, so every lookup keyed on the
/// phone string sees the same form.
pub fn format_phone_number(phone: &str) -> String {
    if phone.is_empty() {
        return String::new();
    }

    let mut cleaned: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if !cleaned.starts_with('+') {
        let digits_only: String = cleaned.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits_only.starts_with("91") && digits_only.len() == 12 {
            cleaned = format!("+{}", digits_only);
        } else {
            cleaned = format!("+91{}", digits_only);
        }
    }

    cleaned
}

/// Accepts international E.164 form, or bare 10-digit Indian mobiles
/// (starting 6-9) with or without the 91 country code. +91 numbers are held
/// to the Indian mobile plan, since that is what the formatter prefixes by
/// default.
pub fn validate_phone_number(phone: &str) -> bool {
    if phone.is_empty() {
        return false;
    }

    let cleaned: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    let indian_mobile = Regex::new(r"^[6-9]\d{9}$").unwrap();

    if let Some(rest) = cleaned.strip_prefix("+91") {
        return indian_mobile.is_match(rest);
    }

    let international = Regex::new(r"^\+\d{1,3}\d{3,14}$").unwrap();
    if international.is_match(&cleaned) {
        return true;
    }

    let digits_only: String = cleaned.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits_only.len() == 10 && indian_mobile.is_match(&digits_only) {
        return true;
    }

    if digits_only.len() == 12 && digits_only.starts_with("91") {
        return indian_mobile.is_match(&digits_only[2..]);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_adds_default_country_code() {
        assert_eq!(format_phone_number("9876543210"), "+919876543210");
    }

    #[test]
    fn format_recognizes_existing_country_code() {
        assert_eq!(format_phone_number("919876543210"), "+919876543210");
        assert_eq!(format_phone_number("+919876543210"), "+919876543210");
        assert_eq!(format_phone_number("+1 415 555 2671"), "+14155552671");
    }

    #[test]
    fn format_strips_separators() {
        assert_eq!(format_phone_number("98765-43210"), "+919876543210");
        assert_eq!(format_phone_number("(987) 654 3210"), "+919876543210");
    }

    #[test]
    fn validate_accepts_international_and_indian_forms() {
        assert!(validate_phone_number("+919876543210"));
        assert!(validate_phone_number("+14155552671"));
        assert!(validate_phone_number("9876543210"));
        assert!(validate_phone_number("919876543210"));
    }

    #[test]
    fn validate_rejects_bad_numbers() {
        assert!(!validate_phone_number(""));
        assert!(!validate_phone_number("12345"));
        assert!(!validate_phone_number("+9112345")); // +91 but not a mobile number
        assert!(!validate_phone_number("1234567890")); // 10 digits but not 6-9 leading
        assert!(!validate_phone_number("abcdefghij"));
    }

    #[test]
    fn password_rules() {
        assert!(Validator::validate_password("secret1").is_ok());
        assert!(Validator::validate_password("short").is_err());
    }

    #[test]
    fn otp_must_be_six_digits() {
        assert!(Validator::validate_otp("482913").is_ok());
        assert!(Validator::validate_otp("48291").is_err());
        assert!(Validator::validate_otp("48291a").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(Validator::validate_email("asha@example.com").is_ok());
        assert!(Validator::validate_email("not-an-email").is_err());
    }
}
