use chrono::{DateTime, Utc};
use rusqlite::params;

use murmur_shared::{MessageId, UserId};

use crate::database::{decode_timestamp, encode_timestamp, Database};
use crate::error::{Result, StoreError};
use crate::models::{Message, NewMessage};

impl Database {
    pub fn insert_message(&self, message: &NewMessage, timestamp: DateTime<Utc>) -> Result<Message> {
        self.conn().execute(
            "INSERT INTO messages (sender_id, receiver_id, content, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                message.sender_id.0,
                message.receiver_id.0,
                message.content,
                encode_timestamp(&timestamp),
            ],
        )?;

        Ok(Message {
            id: MessageId(self.conn().last_insert_rowid()),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content.clone(),
            timestamp,
        })
    }

    pub fn get_messages_involving(&self, user: UserId) -> Result<Vec<Message>> {
        self.collect_messages(
            "SELECT id, sender_id, receiver_id, content, timestamp
             FROM messages
             WHERE sender_id = ?1 OR receiver_id = ?1
             ORDER BY timestamp ASC, id ASC",
            params![user.0],
        )
    }

    pub fn get_messages_between(&self, a: UserId, b: UserId) -> Result<Vec<Message>> {
        self.collect_messages(
            "SELECT id, sender_id, receiver_id, content, timestamp
             FROM messages
             WHERE (sender_id = ?1 AND receiver_id = ?2)
                OR (sender_id = ?2 AND receiver_id = ?1)
             ORDER BY timestamp ASC, id ASC",
            params![a.0, b.0],
        )
    }

    fn collect_messages(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params, row_to_message)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let ts_str: String = row.get(4)?;

    Ok(Message {
        id: MessageId(row.get(0)?),
        sender_id: UserId(row.get(1)?),
        receiver_id: UserId(row.get(2)?),
        content: row.get(3)?,
        timestamp: decode_timestamp(&ts_str, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn seeded() -> (Database, UserId, UserId, UserId) {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_user(&NewUser::named("a"), at(0)).unwrap().id;
        let b = db.insert_user(&NewUser::named("b"), at(0)).unwrap().id;
        let c = db.insert_user(&NewUser::named("c"), at(0)).unwrap().id;
        (db, a, b, c)
    }

    fn send(db: &Database, from: UserId, to: UserId, text: &str, millis: i64) -> Message {
        db.insert_message(
            &NewMessage {
                sender_id: from,
                receiver_id: to,
                content: text.into(),
            },
            at(millis),
        )
        .unwrap()
    }

    #[test]
    fn test_between_filters_and_orders() {
        let (db, a, b, c) = seeded();
        send(&db, b, a, "second", 200);
        send(&db, a, c, "elsewhere", 150);
        send(&db, a, b, "first", 100);

        let thread: Vec<_> = db
            .get_messages_between(a, b)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(thread, ["first", "second"]);

        assert_eq!(db.get_messages_involving(a).unwrap().len(), 3);
        assert_eq!(db.get_messages_involving(c).unwrap().len(), 1);
    }

    #[test]
    fn test_equal_timestamps_order_by_id() {
        let (db, a, b, _) = seeded();
        let first = send(&db, a, b, "x", 100);
        let second = send(&db, b, a, "y", 100);

        let ids: Vec<_> = db
            .get_messages_between(a, b)
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, [first.id, second.id]);
    }

    #[test]
    fn test_unknown_sender_violates_foreign_key() {
        let (db, a, _, _) = seeded();
        let result = db.insert_message(
            &NewMessage {
                sender_id: UserId(404),
                receiver_id: a,
                content: "ghost".into(),
            },
            at(1),
        );
        assert!(result.is_err());
    }
}
