use rusqlite::Connection;

use super::{OptionalExt, USER_COLUMNS, user_from_row};
use crate::models::{NewUser, UserRow, UserUpdate};
use crate::{Database, DbError, DbResult};

impl Database {
    /// Insert a signed-up user. Username and email uniqueness is enforced by the
    /// store and reported as `DbError::Conflict`.
    pub fn create_user(&self, user: &NewUser) -> DbResult<UserRow> {
        if user.username.is_empty() || user.email.is_empty() || user.password_hash.is_empty() {
            return Err(DbError::Validation(
                "username, email and password are required".into(),
            ));
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, image_url, header_image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    &user.username,
                    &user.email,
                    &user.password_hash,
                    &user.image_url,
                    &user.header_image_url,
                ),
            )?;
            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)?.ok_or(DbError::NotFound("user"))
        })
    }

    pub fn get_user(&self, id: i64) -> DbResult<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_username(&self, username: &str) -> DbResult<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1"),
                [username],
                user_from_row,
            )
            .optional()
        })
    }

    /// All users in id order, optionally narrowed to usernames containing `search`
    /// (case-insensitive).
    pub fn list_users(&self, search: Option<&str>) -> DbResult<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users u
                 WHERE ?1 IS NULL OR instr(lower(u.username), lower(?1)) > 0
                 ORDER BY u.id"
            ))?;
            let rows = stmt
                .query_map([search], user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_users(&self) -> DbResult<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
            Ok(n as usize)
        })
    }

    /// Apply a profile edit and return the stored result.
    pub fn update_user(&self, id: i64, update: &UserUpdate) -> DbResult<UserRow> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    username = COALESCE(?2, username),
                    email = COALESCE(?3, email),
                    image_url = COALESCE(?4, image_url),
                    header_image_url = COALESCE(?5, header_image_url),
                    bio = COALESCE(?6, bio),
                    location = COALESCE(?7, location)
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    update.username,
                    update.email,
                    update.image_url,
                    update.header_image_url,
                    update.bio,
                    update.location,
                ],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound("user"));
            }
            query_user_by_id(conn, id)?.ok_or(DbError::NotFound("user"))
        })
    }

    /// Delete a user. Their messages, likes and follow edges go with them.
    pub fn delete_user(&self, id: i64) -> DbResult<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: i64) -> DbResult<Option<UserRow>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
        [id],
        user_from_row,
    )
    .optional()
}
