use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use warbler_types::models::MAX_MESSAGE_LEN;

use super::{MESSAGE_SELECT, OptionalExt, message_from_row};
use crate::models::MessageRow;
use crate::queries::users::query_user_by_id;
use crate::{Database, DbError, DbResult};

impl Database {
    /// Post a message as `user_id`. Surrounding whitespace is dropped before the
    /// length check. The timestamp is taken here, in UTC.
    pub fn create_message(&self, user_id: i64, text: &str) -> DbResult<MessageRow> {
        let text = text.trim();
        validate_text(text)?;

        // Fixed-width microsecond RFC 3339 so lexical order is chronological.
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        self.with_conn(|conn| {
            if query_user_by_id(conn, user_id)?.is_none() {
                return Err(DbError::NotFound("user"));
            }

            conn.execute(
                "INSERT INTO messages (text, timestamp, user_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![text, timestamp, user_id],
            )?;
            let id = conn.last_insert_rowid();
            query_message_by_id(conn, id)?.ok_or(DbError::NotFound("message"))
        })
    }

    pub fn get_message(&self, id: i64) -> DbResult<Option<MessageRow>> {
        self.with_conn(|conn| query_message_by_id(conn, id))
    }

    /// A user's own messages, newest first.
    pub fn list_messages_by_user(&self, user_id: i64, limit: u32) -> DbResult<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT}
                 WHERE m.user_id = ?1
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], message_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_messages_by_user(&self, user_id: i64) -> DbResult<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE user_id = ?1",
                [user_id],
                |r| r.get(0),
            )?;
            Ok(n as usize)
        })
    }

    /// Home timeline: messages written by `user_id` or by anyone they follow,
    /// newest first.
    pub fn timeline(&self, user_id: i64, limit: u32) -> DbResult<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT}
                 WHERE m.user_id = ?1
                    OR m.user_id IN (
                        SELECT user_being_followed_id FROM follows WHERE user_following_id = ?1
                    )
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], message_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete a message and its likes. Ownership is the caller's concern.
    pub fn delete_message(&self, id: i64) -> DbResult<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn validate_text(text: &str) -> DbResult<()> {
    if text.is_empty() {
        return Err(DbError::Validation("message text is required".into()));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(DbError::Validation(format!(
            "message text is limited to {MAX_MESSAGE_LEN} characters"
        )));
    }
    Ok(())
}

pub(crate) fn query_message_by_id(conn: &Connection, id: i64) -> DbResult<Option<MessageRow>> {
    conn.query_row(&format!("{MESSAGE_SELECT} WHERE m.id = ?1"), [id], message_from_row)
        .optional()
}
