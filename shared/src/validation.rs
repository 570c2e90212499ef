//! Input sanitization and validation helpers
//!
//! Sanitizers normalize free-form input before it is written; predicates
//! decide whether a (sanitized) value is acceptable.

use crate::error::{AppError, ErrorCode};
use regex::Regex;
use std::sync::LazyLock;

// ── Length limits ───────────────────────────────────────────────────

/// Free text: names, notes, allergy notes
pub const MAX_TEXT_LEN: usize = 300;

/// Section / row / seat codes
pub const MAX_SEAT_FIELD_LEN: usize = 10;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// US phone numbers
pub const PHONE_DIGITS: usize = 10;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ── Sanitizers ──────────────────────────────────────────────────────

/// Trim, strip tags, drop `< > " ' &`, truncate to [`MAX_TEXT_LEN`]
pub fn sanitize_text(input: &str) -> String {
    sanitize_text_with_limit(input, MAX_TEXT_LEN)
}

pub fn sanitize_text_with_limit(input: &str, max_len: usize) -> String {
    let stripped = TAG_RE.replace_all(input.trim(), "");
    let cleaned: String = stripped
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '&'))
        .collect();
    truncate_chars(&cleaned, max_len)
}

/// Keep ASCII alphanumerics only, truncate to [`MAX_SEAT_FIELD_LEN`]
pub fn sanitize_seat_field(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_SEAT_FIELD_LEN)
        .collect()
}

/// Trim, lower-case, truncate to [`MAX_EMAIL_LEN`]
pub fn sanitize_email(input: &str) -> String {
    truncate_chars(&input.trim().to_lowercase(), MAX_EMAIL_LEN)
}

/// Digits of a phone number, at most [`PHONE_DIGITS`]
pub fn phone_digits(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(PHONE_DIGITS)
        .collect()
}

/// Progressive `(555) 123-4567` formatting as the user types
pub fn format_phone(input: &str) -> String {
    let d = phone_digits(input);
    match d.len() {
        0..=3 => d,
        4..=6 => format!("({}) {}", &d[..3], &d[3..]),
        _ => format!("({}) {}-{}", &d[..3], &d[3..6], &d[6..]),
    }
}

// ── Predicates ──────────────────────────────────────────────────────

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// 1 to 10 ASCII alphanumerics
pub fn is_valid_seat_field(value: &str) -> bool {
    (1..=MAX_SEAT_FIELD_LEN).contains(&value.len()) && value.chars().all(|c| c.is_ascii_alphanumeric())
}

/// At least 8 characters and at least one digit
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN && password.chars().any(|c| c.is_ascii_digit())
}

pub fn is_valid_phone(input: &str) -> bool {
    input.chars().filter(char::is_ascii_digit).count() >= PHONE_DIGITS
}

// ── Field error collection ──────────────────────────────────────────

/// Per-field validation messages, collected before any write
#[derive(Debug, Default, Clone)]
pub struct FieldErrors {
    errors: Vec<(String, String)>,
    code: Option<ErrorCode>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push((field.into(), message.into()));
    }

    /// Record `message` for `field` when `ok` is false
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Like [`check`](Self::check), tagging the failure with a specific code
    pub fn check_as(&mut self, ok: bool, code: ErrorCode, field: &str, message: &str) {
        if !ok {
            if self.errors.is_empty() {
                self.code = Some(code);
            }
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, m)| m.as_str())
    }

    /// `Ok(())` when nothing was recorded, otherwise an error carrying every
    /// field message as a detail. The code is the one tagged on the first
    /// failure, or `default` when it was untagged.
    pub fn into_result(self, default: ErrorCode) -> Result<(), AppError> {
        let Some((_, first)) = self.errors.first() else {
            return Ok(());
        };
        let mut err = AppError::with_message(self.code.unwrap_or(default), first.clone());
        for (field, message) in self.errors {
            err = err.with_detail(field, message);
        }
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_text_strips_markup() {
        let out = sanitize_text("<b>hi</b>&'\"");
        assert_eq!(out, "hi");
        assert!(!out.contains(['<', '>', '"', '\'', '&']));
        assert!(out.chars().count() <= MAX_TEXT_LEN);
    }

    #[test]
    fn test_sanitize_text_truncates() {
        let long = "a".repeat(500);
        assert_eq!(sanitize_text(&long).len(), MAX_TEXT_LEN);
        assert_eq!(sanitize_text_with_limit("  hello world ", 5), "hello");
        // Stray brackets that don't form a tag are still removed
        assert_eq!(sanitize_text("a < b > c"), "a  c");
        assert_eq!(sanitize_text("1 < 2"), "1  2");
    }

    #[test]
    fn test_sanitize_seat_field() {
        assert_eq!(sanitize_seat_field(" 1-12 b "), "112b");
        assert_eq!(sanitize_seat_field("ABCDEFGHIJKLMN"), "ABCDEFGHIJ");
        assert_eq!(sanitize_seat_field("#!"), "");
    }

    #[test]
    fn test_sanitize_email() {
        assert_eq!(sanitize_email("  Fan@Example.COM "), "fan@example.com");
        assert_eq!(sanitize_email(&"x".repeat(300)).len(), MAX_EMAIL_LEN);
    }

    #[test]
    fn test_email_predicate() {
        assert!(is_valid_email("fan@example.com"));
        assert!(!is_valid_email("fan@example"));
        assert!(!is_valid_email("fan example@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_seat_predicate() {
        assert!(is_valid_seat_field("112"));
        assert!(is_valid_seat_field("AA"));
        assert!(!is_valid_seat_field(""));
        assert!(!is_valid_seat_field("12-A"));
        assert!(!is_valid_seat_field("12345678901"));
    }

    #[test]
    fn test_password_predicate() {
        assert!(is_valid_password("abc12345"));
        assert!(!is_valid_password("abcdefgh"));
        assert!(!is_valid_password("ab1"));
    }

    #[test]
    fn test_phone() {
        assert_eq!(format_phone("555"), "555");
        assert_eq!(format_phone("5551"), "(555) 1");
        assert_eq!(format_phone("555123"), "(555) 123");
        assert_eq!(format_phone("5551234567"), "(555) 123-4567");
        assert_eq!(format_phone("555-123-4567 ext 9"), "(555) 123-4567");
        assert!(is_valid_phone("(555) 123-4567"));
        assert!(!is_valid_phone("555-1234"));
    }

    #[test]
    fn test_field_errors() {
        let mut errors = FieldErrors::new();
        assert!(errors.clone().into_result(ErrorCode::ValidationFailed).is_ok());

        errors.check(false, "name", "Name is required");
        errors.check(true, "seat", "Required");
        errors.add("phone", "Enter a valid 10-digit number");
        assert_eq!(errors.get("seat"), None);

        let err = errors.into_result(ErrorCode::ValidationFailed).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Name is required");
        assert_eq!(err.detail_str("phone"), Some("Enter a valid 10-digit number"));
    }

    #[test]
    fn test_field_errors_first_code_wins() {
        let mut errors = FieldErrors::new();
        errors.check_as(false, ErrorCode::CartEmpty, "cart", "Cart is empty");
        errors.check_as(false, ErrorCode::PasswordMismatch, "confirm_password", "Passwords do not match");
        assert_eq!(errors.len(), 2);

        let err = errors.into_result(ErrorCode::ValidationFailed).unwrap_err();
        assert_eq!(err.code, ErrorCode::CartEmpty);
        assert_eq!(err.detail_str("confirm_password"), Some("Passwords do not match"));
    }
}
