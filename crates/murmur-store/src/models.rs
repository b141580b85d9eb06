//! Domain records held by the store.
//!
//! Every struct derives `Serialize` and `Deserialize` with camelCase field
//! names so it can be handed straight to the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use murmur_shared::{MessageId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A directory entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Unique login handle.
    pub username: String,
    /// Optional human-readable display name.
    pub name: Option<String>,
    /// Optional avatar URL.
    pub profile_picture: Option<String>,
    /// Presence flag, flipped by the session lifecycle.
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when registering a user. The store assigns the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub name: Option<String>,
    pub profile_picture: Option<String>,
}

impl NewUser {
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }
}

/// Partial profile update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub profile_picture: Option<String>,
}

impl ProfileUpdate {
    pub fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = Some(name);
        }
        if let Some(picture) = self.profile_picture {
            user.profile_picture = Some(picture);
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A direct message. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    /// Assigned by the store at append time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// The participant that is not `user`. For a self-message that is
    /// `user` again.
    pub fn counterparty_of(&self, user: UserId) -> UserId {
        if self.sender_id == user {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    pub fn involves(&self, user: UserId) -> bool {
        self.sender_id == user || self.receiver_id == user
    }

    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    /// Ordering key: timestamp first, id breaks ties.
    pub fn order_key(&self) -> (DateTime<Utc>, MessageId) {
        (self.timestamp, self.id)
    }
}

/// A message as submitted, before the store assigns id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
}
