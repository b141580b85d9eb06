//! In-process [`ChatStore`] backed by ordered maps.
//!
//! Nothing survives a restart. Ids are handed out from per-table counters
//! starting at 1, so iterating the maps yields records in insertion order.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use murmur_shared::{MessageId, UserId};

use crate::clock::{stamp, system_clock, Clock};
use crate::error::{Result, StoreError};
use crate::models::{Message, NewMessage, NewUser, ProfileUpdate, User};
use crate::store::ChatStore;

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    messages: BTreeMap<MessageId, Message>,
    next_user_id: i64,
    next_message_id: i64,
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    clock: Clock,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_user_id: 1,
                next_message_id: 1,
                ..Tables::default()
            }),
            clock,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn sorted_messages<F>(&self, keep: F) -> Result<Vec<Message>>
    where
        F: Fn(&Message) -> bool,
    {
        let tables = self.read()?;
        let mut messages: Vec<Message> =
            tables.messages.values().filter(|m| keep(m)).cloned().collect();
        // Map order is id order; timestamps from a wall clock can still step
        // backwards, so sort explicitly.
        messages.sort_by_key(Message::order_key);
        Ok(messages)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatStore for MemoryStore {
    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.username == new_user.username) {
            return Err(StoreError::UsernameTaken(new_user.username));
        }

        let id = UserId(tables.next_user_id);
        tables.next_user_id += 1;

        let user = User {
            id,
            username: new_user.username,
            name: new_user.name,
            profile_picture: new_user.profile_picture,
            is_online: true,
            created_at: stamp(&self.clock),
        };
        tables.users.insert(id, user.clone());

        debug!(user_id = %id, username = %user.username, "user created");
        Ok(user)
    }

    fn set_online(&self, id: UserId, is_online: bool) -> Result<Option<User>> {
        let mut tables = self.write()?;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.is_online = is_online;
            user.clone()
        }))
    }

    fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<Option<User>> {
        let mut tables = self.write()?;
        Ok(tables.users.get_mut(&id).map(|user| {
            update.apply_to(user);
            user.clone()
        }))
    }

    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    fn append_message(&self, new_message: NewMessage) -> Result<Message> {
        let mut tables = self.write()?;

        let id = MessageId(tables.next_message_id);
        tables.next_message_id += 1;

        let message = Message {
            id,
            sender_id: new_message.sender_id,
            receiver_id: new_message.receiver_id,
            content: new_message.content,
            timestamp: stamp(&self.clock),
        };
        tables.messages.insert(id, message.clone());

        debug!(
            message_id = %id,
            sender = %message.sender_id,
            receiver = %message.receiver_id,
            "message appended"
        );
        Ok(message)
    }

    fn messages_involving(&self, user: UserId) -> Result<Vec<Message>> {
        self.sorted_messages(|m| m.involves(user))
    }

    fn messages_between(&self, a: UserId, b: UserId) -> Result<Vec<Message>> {
        self.sorted_messages(|m| m.is_between(a, b))
    }
}
