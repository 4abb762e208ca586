use std::collections::HashMap;

use super::{MESSAGE_SELECT, OptionalExt, like_from_row, message_from_row};
use crate::models::{LikeRow, MessageRow};
use crate::{Database, DbError, DbResult};

impl Database {
    /// Toggle a like: removes it if it exists, inserts it if not.
    /// Returns `true` when the like was added.
    pub fn toggle_like(&self, user_id: i64, message_id: i64) -> DbResult<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let message_exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM messages WHERE id = ?1)",
                [message_id],
                |r| r.get(0),
            )?;
            if !message_exists {
                return Err(DbError::NotFound("message"));
            }

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM likes WHERE user_id = ?1 AND message_id = ?2",
                    [user_id, message_id],
                    |row| row.get(0),
                )
                .optional()?;

            let added = if let Some(like_id) = existing {
                tx.execute("DELETE FROM likes WHERE id = ?1", [like_id])?;
                false
            } else {
                tx.execute(
                    "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                    [user_id, message_id],
                )?;
                true
            };

            tx.commit()?;
            Ok(added)
        })
    }

    pub fn likes_for_message(&self, message_id: i64) -> DbResult<Vec<LikeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, message_id FROM likes WHERE message_id = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([message_id], like_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_likes(&self, message_id: i64) -> DbResult<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE message_id = ?1",
                [message_id],
                |r| r.get(0),
            )?;
            Ok(n as usize)
        })
    }

    pub fn liked_message_ids(&self, user_id: i64) -> DbResult<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT message_id FROM likes WHERE user_id = ?1 ORDER BY id")?;
            let ids = stmt
                .query_map([user_id], |row| row.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Messages `user_id` has liked, most recently liked first.
    pub fn list_liked_messages(&self, user_id: i64) -> DbResult<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT}
                 JOIN likes l ON l.message_id = m.id
                 WHERE l.user_id = ?1
                 ORDER BY l.id DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], message_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch like counts for a set of message IDs. Messages without likes are absent.
    pub fn like_counts(&self, message_ids: &[i64]) -> DbResult<HashMap<i64, usize>> {
        if message_ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=message_ids.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "SELECT message_id, COUNT(*) FROM likes WHERE message_id IN ({}) GROUP BY message_id",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let counts = stmt
                .query_map(rusqlite::params_from_iter(message_ids), |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? as usize))
                })?
                .collect::<Result<HashMap<_, _>, _>>()?;

            Ok(counts)
        })
    }
}
