//! Durable [`ChatStore`] over a single SQLite connection.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use murmur_shared::UserId;

use crate::clock::{stamp, system_clock, Clock};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Message, NewMessage, NewUser, ProfileUpdate, User};
use crate::store::ChatStore;

/// A `rusqlite::Connection` is not `Sync`, so access is serialised.
pub struct SqliteStore {
    db: Mutex<Database>,
    clock: Clock,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, system_clock())
    }

    pub fn with_clock(db: Database, clock: Clock) -> Self {
        Self {
            db: Mutex::new(db),
            clock,
        }
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| StoreError::Unavailable("database lock poisoned".into()))
    }
}

impl ChatStore for SqliteStore {
    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.db()?.find_user(id)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.db()?.find_user_by_username(username)
    }

    fn create_user(&self, new_user: NewUser) -> Result<User> {
        let user = self.db()?.insert_user(&new_user, stamp(&self.clock))?;
        tracing::debug!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    fn set_online(&self, id: UserId, is_online: bool) -> Result<Option<User>> {
        let db = self.db()?;
        if !db.set_user_online(id, is_online)? {
            return Ok(None);
        }
        db.find_user(id)
    }

    fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<Option<User>> {
        let db = self.db()?;
        if !db.update_user_profile(id, &update)? {
            return Ok(None);
        }
        db.find_user(id)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        self.db()?.all_users()
    }

    fn append_message(&self, new_message: NewMessage) -> Result<Message> {
        let message = self.db()?.insert_message(&new_message, stamp(&self.clock))?;
        tracing::debug!(
            message_id = %message.id,
            sender = %message.sender_id,
            receiver = %message.receiver_id,
            "message appended"
        );
        Ok(message)
    }

    fn messages_involving(&self, user: UserId) -> Result<Vec<Message>> {
        self.db()?.get_messages_involving(user)
    }

    fn messages_between(&self, a: UserId, b: UserId) -> Result<Vec<Message>> {
        self.db()?.get_messages_between(a, b)
    }
}
