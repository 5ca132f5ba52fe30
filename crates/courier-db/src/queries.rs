use crate::Database;
use crate::models::{MessageDetailRow, MessageRow, ReadReceiptRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Insert a user. Returns `Ok(false)` when the username is already
    /// taken (primary-key violation), so the insert doubles as the
    /// uniqueness check under a single lock acquisition.
    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        phone: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password, first_name, last_name, phone)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![username, password_hash, first_name, last_name, phone],
            );

            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    // -- Messages --

    /// Insert a message from `from_username` to `to_username`. Id and
    /// `sent_at` are assigned by SQLite. Returns `Ok(None)` when the
    /// insert hits a foreign-key violation, i.e. the recipient does not
    /// exist (the sender always exists — it came from a validated token).
    pub fn insert_message(
        &self,
        from_username: &str,
        to_username: &str,
        body: &str,
    ) -> Result<Option<MessageRow>> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO messages (from_username, to_username, body)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![from_username, to_username, body],
            );

            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }

            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                "SELECT id, from_username, to_username, body, sent_at
                 FROM messages WHERE id = ?1",
                [id],
                |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        from_username: row.get(1)?,
                        to_username: row.get(2)?,
                        body: row.get(3)?,
                        sent_at: row.get(4)?,
                    })
                },
            )?;

            Ok(Some(row))
        })
    }

    /// Fetch a message with both user records, but only if `username` is
    /// the sender or the recipient. A missing row and a row the caller is
    /// not party to are indistinguishable (both `None`), so existence of
    /// other people's messages never leaks.
    pub fn get_message_for(&self, id: i64, username: &str) -> Result<Option<MessageDetailRow>> {
        self.with_conn(|conn| query_message_for(conn, id, username))
    }

    /// Mark a message read, but only for its intended recipient. The
    /// filtered update is simultaneously the authorization check and the
    /// mutation; `read_at IS NULL` makes the write happen at most once.
    /// Re-marking by the recipient re-reads the original receipt.
    pub fn mark_read(&self, id: i64, username: &str) -> Result<Option<ReadReceiptRow>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE messages SET read_at = datetime('now')
                 WHERE id = ?1 AND to_username = ?2 AND read_at IS NULL",
                rusqlite::params![id, username],
            )?;

            let row = conn
                .query_row(
                    "SELECT id, read_at FROM messages
                     WHERE id = ?1 AND to_username = ?2 AND read_at IS NOT NULL",
                    rusqlite::params![id, username],
                    |row| {
                        Ok(ReadReceiptRow {
                            id: row.get(0)?,
                            read_at: row.get(1)?,
                        })
                    },
                )
                .optional()?;

            Ok(row)
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT username, password, first_name, last_name, phone, joined_at
         FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                username: row.get(0)?,
                password: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                phone: row.get(4)?,
                joined_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_message_for(conn: &Connection, id: i64, username: &str) -> Result<Option<MessageDetailRow>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.body, m.sent_at, m.read_at,
                fu.username, fu.first_name, fu.last_name, fu.phone,
                tu.username, tu.first_name, tu.last_name, tu.phone
         FROM messages m
         INNER JOIN users fu ON m.from_username = fu.username
         INNER JOIN users tu ON m.to_username = tu.username
         WHERE m.id = ?1 AND (m.from_username = ?2 OR m.to_username = ?2)",
    )?;

    let row = stmt
        .query_row(rusqlite::params![id, username], |row| {
            Ok(MessageDetailRow {
                id: row.get(0)?,
                body: row.get(1)?,
                sent_at: row.get(2)?,
                read_at: row.get(3)?,
                from_username: row.get(4)?,
                from_first_name: row.get(5)?,
                from_last_name: row.get(6)?,
                from_phone: row.get(7)?,
                to_username: row.get(8)?,
                to_first_name: row.get(9)?,
                to_last_name: row.get(10)?,
                to_phone: row.get(11)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
