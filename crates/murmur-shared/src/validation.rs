//! Input rules applied before anything reaches the store.

use crate::constants::{MAX_DISPLAY_NAME_LEN, MAX_USERNAME_LEN};
use crate::error::ValidationError;

/// Check message content. Content is stored as submitted, so this only
/// inspects it: whitespace-only text is rejected, as is text longer than
/// `max_len` characters.
pub fn validate_message_content(content: &str, max_len: usize) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    let len = content.chars().count();
    if len > max_len {
        return Err(ValidationError::ContentTooLong { len, max: max_len });
    }
    Ok(())
}

/// Trim a requested username and check it. Returns the trimmed form.
pub fn normalize_username(raw: &str) -> Result<String, ValidationError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    let len = username.chars().count();
    if len > MAX_USERNAME_LEN {
        return Err(ValidationError::UsernameTooLong {
            len,
            max: MAX_USERNAME_LEN,
        });
    }
    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::UsernameWhitespace);
    }
    Ok(username.to_string())
}

pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len > MAX_DISPLAY_NAME_LEN {
        return Err(ValidationError::DisplayNameTooLong {
            len,
            max: MAX_DISPLAY_NAME_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_rules() {
        assert!(validate_message_content("hi", 10).is_ok());
        assert_eq!(
            validate_message_content("   \n\t", 10),
            Err(ValidationError::EmptyContent)
        );
        assert_eq!(
            validate_message_content("", 10),
            Err(ValidationError::EmptyContent)
        );
        assert_eq!(
            validate_message_content("abcdef", 5),
            Err(ValidationError::ContentTooLong { len: 6, max: 5 })
        );
    }

    #[test]
    fn test_content_length_counts_chars() {
        // 5 chars, 10 bytes
        assert!(validate_message_content("ééééé", 5).is_ok());
    }

    #[test]
    fn test_username_is_trimmed() {
        assert_eq!(normalize_username("  alice ").unwrap(), "alice");
    }

    #[test]
    fn test_username_rejections() {
        assert_eq!(normalize_username("  "), Err(ValidationError::EmptyUsername));
        assert_eq!(
            normalize_username("al ice"),
            Err(ValidationError::UsernameWhitespace)
        );
        assert!(matches!(
            normalize_username(&"x".repeat(MAX_USERNAME_LEN + 1)),
            Err(ValidationError::UsernameTooLong { .. })
        ));
    }

    #[test]
    fn test_display_name_limit() {
        assert!(validate_display_name("Alice Liddell").is_ok());
        assert!(validate_display_name(&"y".repeat(MAX_DISPLAY_NAME_LEN + 1)).is_err());
    }
}
