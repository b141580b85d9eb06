//! CRUD operations for [`User`] records.

use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension};

use murmur_shared::UserId;

use crate::database::{decode_timestamp, encode_timestamp, Database};
use crate::error::{Result, StoreError};
use crate::models::{NewUser, ProfileUpdate, User};

const USER_COLUMNS: &str = "id, username, name, profile_picture, is_online, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new user, online, and return it with its assigned id.
    pub fn insert_user(&self, new_user: &NewUser, created_at: DateTime<Utc>) -> Result<User> {
        self.conn()
            .execute(
                "INSERT INTO users (username, name, profile_picture, is_online, created_at)
                 VALUES (?1, ?2, ?3, 1, ?4)",
                params![
                    new_user.username,
                    new_user.name,
                    new_user.profile_picture,
                    encode_timestamp(&created_at),
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    StoreError::UsernameTaken(new_user.username.clone())
                }
                other => StoreError::Sqlite(other),
            })?;

        Ok(User {
            id: UserId(self.conn().last_insert_rowid()),
            username: new_user.username.clone(),
            name: new_user.name.clone(),
            profile_picture: new_user.profile_picture.clone(),
            is_online: true,
            created_at,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        Ok(self
            .conn()
            .query_row(&sql, params![id.0], row_to_user)
            .optional()?)
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
        Ok(self
            .conn()
            .query_row(&sql, params![username], row_to_user)
            .optional()?)
    }

    /// All users, ordered by id.
    pub fn all_users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map([], row_to_user)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Returns `false` if no such user exists.
    pub fn set_user_online(&self, id: UserId, is_online: bool) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET is_online = ?1 WHERE id = ?2",
            params![is_online, id.0],
        )?;
        Ok(affected > 0)
    }

    /// Returns `false` if no such user exists.
    pub fn update_user_profile(&self, id: UserId, update: &ProfileUpdate) -> Result<bool> {
        // COALESCE keeps the stored value where the update leaves a field out.
        let affected = self.conn().execute(
            "UPDATE users
             SET name = COALESCE(?1, name),
                 profile_picture = COALESCE(?2, profile_picture)
             WHERE id = ?3",
            params![update.name, update.profile_picture, id.0],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_str: String = row.get(5)?;

    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        name: row.get(2)?,
        profile_picture: row.get(3)?,
        is_online: row.get(4)?,
        created_at: decode_timestamp(&created_str, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_000).unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let db = db();
        let created = db.insert_user(&NewUser::named("alice"), now()).unwrap();

        let found = db.find_user(created.id).unwrap().unwrap();
        assert_eq!(found, created);
        assert!(found.is_online);

        let by_name = db.find_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[test]
    fn test_duplicate_username_is_rejected() {
        let db = db();
        db.insert_user(&NewUser::named("alice"), now()).unwrap();
        let err = db.insert_user(&NewUser::named("alice"), now()).unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken(name) if name == "alice"));
    }

    #[test]
    fn test_missing_user_is_none() {
        assert!(db().find_user(UserId(99)).unwrap().is_none());
        assert!(!db().set_user_online(UserId(99), false).unwrap());
    }

    #[test]
    fn test_profile_update_keeps_unset_fields() {
        let db = db();
        let user = db
            .insert_user(
                &NewUser {
                    username: "bob".into(),
                    name: Some("Bob".into()),
                    profile_picture: Some("old.png".into()),
                },
                now(),
            )
            .unwrap();

        let update = ProfileUpdate {
            name: None,
            profile_picture: Some("new.png".into()),
        };
        assert!(db.update_user_profile(user.id, &update).unwrap());

        let user = db.find_user(user.id).unwrap().unwrap();
        assert_eq!(user.name.as_deref(), Some("Bob"));
        assert_eq!(user.profile_picture.as_deref(), Some("new.png"));
    }
}
