//! Validation rules and custom validators

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    ).unwrap();

    static ref PHONE_REGEX: Regex = Regex::new(
        r"^\+?[\d\s-]{10,}$"
    ).unwrap();

    // scheme://[userinfo@]host[:port][path], host being a name or a bracketed IP literal
    static ref URL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z][a-zA-Z0-9+.\-]*://(?:[^\s/?#@]+@)?(?:[A-Za-z0-9](?:[A-Za-z0-9\-.]*[A-Za-z0-9])?|\[[0-9A-Fa-f:.]+\])(?::\d{1,5})?(?:[/?#]\S*)?$"
    ).unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9_-]{3,50}$"
    ).unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

pub fn is_valid_url(url: &str) -> bool {
    URL_REGEX.is_match(url)
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > 254 {
        return Err(ValidationError::new("email_too_long"));
    }

    if !is_valid_email(email) {
        return Err(ValidationError::new("email_format"));
    }

    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::new("username_format"));
    }

    Ok(())
}

/// 8 to 128 characters with at least one letter and one digit.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();

    if !(8..=128).contains(&len) {
        return Err(ValidationError::new("password_length"));
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(ValidationError::new("password_letter"));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("password_digit"));
    }

    Ok(())
}

/// Length check on the trimmed text, counted in characters.
pub fn validate_text_length(text: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = text.trim().chars().count();

    if len < min {
        return Err(ValidationError::new("too_short"));
    }

    if len > max {
        return Err(ValidationError::new("too_long"));
    }

    Ok(())
}

pub fn validate_tag(tag: &str, max_length: usize) -> Result<(), ValidationError> {
    validate_text_length(tag, 1, max_length)
}
