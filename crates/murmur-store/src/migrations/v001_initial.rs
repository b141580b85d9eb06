//! v001 -- Initial schema creation.
//!
//! Creates the `users` directory and the append-only `messages` log.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    username        TEXT NOT NULL UNIQUE,
    name            TEXT,
    profile_picture TEXT,                       -- avatar URL
    is_online       INTEGER NOT NULL DEFAULT 0, -- boolean 0/1
    created_at      TEXT NOT NULL               -- RFC-3339, millis, UTC
);

-- ----------------------------------------------------------------
-- Messages (append-only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    sender_id   INTEGER NOT NULL,             -- FK -> users(id)
    receiver_id INTEGER NOT NULL,             -- FK -> users(id)
    content     TEXT NOT NULL,
    timestamp   TEXT NOT NULL,                -- RFC-3339, millis, UTC

    FOREIGN KEY (sender_id)   REFERENCES users(id),
    FOREIGN KEY (receiver_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_messages_sender_ts
    ON messages(sender_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_messages_receiver_ts
    ON messages(receiver_id, timestamp);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
