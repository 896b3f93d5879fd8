use regex::Regex;
use std::sync::OnceLock;
use crate::error::{AppError, AppResult};

fn mobile_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(09|\+639)\d{9}$").expect("valid mobile regex"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
    })
}

/// Mobile numbers are accepted as `09XXXXXXXXX` or `+639XXXXXXXXX`.
pub fn validate_contact(contact: &str) -> AppResult<()> {
    if !mobile_regex().is_match(contact) {
        return Err(AppError::ValidationError(
            "Invalid contact number, expected 09XXXXXXXXX or +639XXXXXXXXX".to_string(),
        ));
    }
    Ok(())
}

/// Strips spaces and dashes so `0917 123 4567` and `0917-123-4567` validate.
pub fn normalize_contact(contact: &str) -> String {
    contact
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if !email_regex().is_match(email) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_name(name: &str) -> AppResult<()> {
    let len = name.trim().chars().count();
    if !(2..=120).contains(&len) {
        return Err(AppError::ValidationError(
            "Name length must be between 2 and 120 characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_contact() {
        assert!(validate_contact("09171234567").is_ok());
        assert!(validate_contact("+639171234567").is_ok());
        assert!(validate_contact("0917123456").is_err());
        assert!(validate_contact("9171234567").is_err());
        assert!(validate_contact("+12345678901").is_err());
    }

    #[test]
    fn test_normalize_contact() {
        assert_eq!(normalize_contact("0917 123 4567"), "09171234567");
        assert_eq!(normalize_contact("0917-123-4567"), "09171234567");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("juan.delacruz@example.com").is_ok());
        assert!(validate_email("no-at-sign.example.com").is_err());
        assert!(validate_email("a@b").is_err());
        assert_eq!(normalize_email("  Juan@Example.COM "), "juan@example.com");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Ana").is_ok());
        assert!(validate_name(" A ").is_err());
    }
}
