use thiserror::Error;

/// Rejected user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message content must not be empty")]
    EmptyContent,

    #[error("Message content too long: {len} characters (max {max})")]
    ContentTooLong { len: usize, max: usize },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Username too long: {len} characters (max {max})")]
    UsernameTooLong { len: usize, max: usize },

    #[error("Username must not contain whitespace")]
    UsernameWhitespace,

    #[error("Display name too long: {len} characters (max {max})")]
    DisplayNameTooLong { len: usize, max: usize },
}
