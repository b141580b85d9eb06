//! The storage seam the server is written against.

use murmur_shared::UserId;

use crate::error::Result;
use crate::models::{Message, NewMessage, NewUser, ProfileUpdate, User};

/// User directory plus append-only message log.
///
/// Implementations hand back whole records only and assign ids and
/// timestamps themselves. Message lists are ordered ascending by
/// `(timestamp, id)`.
pub trait ChatStore: Send + Sync {
    // -- Directory --

    fn get_user(&self, id: UserId) -> Result<Option<User>>;

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Fails with [`StoreError::UsernameTaken`](crate::StoreError::UsernameTaken)
    /// if the username is already registered.
    fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Returns the updated user, or `None` if no such user exists.
    fn set_online(&self, id: UserId, is_online: bool) -> Result<Option<User>>;

    /// Returns the updated user, or `None` if no such user exists.
    fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<Option<User>>;

    /// All users, ordered by id.
    fn list_users(&self) -> Result<Vec<User>>;

    // -- Messages --

    fn append_message(&self, new_message: NewMessage) -> Result<Message>;

    /// Every message `user` sent or received.
    fn messages_involving(&self, user: UserId) -> Result<Vec<Message>>;

    /// Every message exchanged between `a` and `b`, in either direction.
    fn messages_between(&self, a: UserId, b: UserId) -> Result<Vec<Message>>;
}
