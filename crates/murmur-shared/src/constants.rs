/// Application name
pub const APP_NAME: &str = "Murmur";

/// Default maximum message length, in characters
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 4096;

/// Maximum username length, in characters
pub const MAX_USERNAME_LEN: usize = 32;

/// Maximum display name length, in characters
pub const MAX_DISPLAY_NAME_LEN: usize = 64;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Header an upstream authenticating proxy sets to the caller's user id
pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";
