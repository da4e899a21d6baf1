//! Custom validation rules referenced from `#[validate(custom(...))]`.

use validator::ValidationError;

/// Validates username content.
///
/// Length is checked separately; this rejects names that are blank once
/// trimmed or that contain control characters.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::new("username_blank"));
    }

    if username.chars().any(char::is_control) {
        return Err(ValidationError::new("username_invalid_characters"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rejects_blank() {
        assert!(validate_username("   ").is_err());
    }

    #[test]
    fn username_rejects_control_chars() {
        assert!(validate_username("bad\nname").is_err());
    }

    #[test]
    fn username_accepts_valid() {
        assert!(validate_username("valid_user123").is_ok());
        assert!(validate_username("Jo Ann").is_ok());
    }
}
