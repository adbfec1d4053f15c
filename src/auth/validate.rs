//! Input validators. Each returns `None` when the value is acceptable or a
//! user-facing message naming the field.

use chrono::NaiveDate;

/// Validate an email: must contain '@' and '.', max 254 chars.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("Email is required".to_string());
    }
    if trimmed.len() > 254 {
        return Some("Email must be at most 254 characters".to_string());
    }
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => None,
        _ => Some("Email must be a valid address".to_string()),
    }
}

/// Validate a new password: min 8 chars.
pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required".to_string());
    }
    if password.chars().count() < 8 {
        return Some("Password must be at least 8 characters".to_string());
    }
    None
}

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    if value.trim().chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate a required calendar date in `YYYY-MM-DD` form.
pub fn validate_date(value: &str, field_name: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.len() != 10 || NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_err() {
        return Some(format!("{field_name} must be a date in YYYY-MM-DD format"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_must_be_real_iso_days() {
        assert_eq!(validate_date("2025-01-10", "Date"), None);
        assert!(validate_date("", "Date").unwrap().contains("required"));
        assert!(validate_date("2025-02-30", "Date").is_some());
        assert!(validate_date("10/01/2025", "Date").is_some());
        assert!(validate_date("2025-1-10", "Date").is_some());
    }

    #[test]
    fn emails_need_local_part_and_dotted_domain() {
        assert_eq!(validate_email("eng@example.com"), None);
        assert!(validate_email("@example.com").is_some());
        assert!(validate_email("eng@localhost").is_some());
    }

    #[test]
    fn required_counts_characters_not_bytes() {
        assert_eq!(validate_required("Ñandú", "Name", 5), None);
        assert!(validate_required("   ", "Name", 5).is_some());
    }
}
