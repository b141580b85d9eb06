//! # murmur-shared
//!
//! Types shared by the Murmur store and server crates: identifier newtypes,
//! the conversation summary wire type, and input validation rules.

pub mod chat;
pub mod constants;
pub mod error;
pub mod types;
pub mod validation;

pub use chat::ConversationSummary;
pub use error::ValidationError;
pub use types::{MessageId, UserId};
