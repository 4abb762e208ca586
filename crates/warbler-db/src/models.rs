//! Database row types: these map directly to SQLite rows.
//! Distinct from warbler-types API models so the password hash never leaves this crate
//! by accident.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use warbler_types::models::{Like, Message, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never plaintext.
    pub password: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub timestamp: String,
    pub user_id: i64,
    pub author_username: String,
    pub author_image_url: String,
}

#[derive(Debug, Clone)]
pub struct LikeRow {
    pub id: i64,
    pub user_id: i64,
    pub message_id: i64,
}

/// A user that has passed signup validation and hashing but is not yet stored.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub image_url: String,
    pub header_image_url: String,
}

/// Profile fields to change. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl MessageRow {
    pub fn created_at(&self) -> DateTime<Utc> {
        parse_timestamp(&self.timestamp).unwrap_or_else(|| {
            warn!("Corrupt timestamp '{}' on message {}", self.timestamp, self.id);
            DateTime::default()
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            image_url: row.image_url,
            header_image_url: row.header_image_url,
            bio: row.bio,
            location: row.location,
        }
    }
}

impl From<&MessageRow> for Message {
    fn from(row: &MessageRow) -> Self {
        Self {
            id: row.id,
            text: row.text.clone(),
            timestamp: row.created_at(),
            user_id: row.user_id,
        }
    }
}

impl From<LikeRow> for Like {
    fn from(row: LikeRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            message_id: row.message_id,
        }
    }
}

/// Timestamps are written as RFC 3339; rows written by hand in SQLite's
/// `datetime('now')` format are accepted too.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_sqlite_formats() {
        let a = parse_timestamp("2024-05-01T12:30:00.000000Z").unwrap();
        let b = parse_timestamp("2024-05-01 12:30:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rows_convert_to_public_models() {
        let row = MessageRow {
            id: 12345,
            text: "msg1".into(),
            timestamp: "2024-05-01T12:30:00.000000Z".into(),
            user_id: 1111,
            author_username: "test1".into(),
            author_image_url: "/img.png".into(),
        };
        let message = Message::from(&row);
        assert_eq!(message.id, 12345);
        assert_eq!(message.user_id, 1111);
        assert_eq!(message.timestamp, parse_timestamp(&row.timestamp).unwrap());

        let like = Like::from(LikeRow { id: 1, user_id: 1111, message_id: 12345 });
        assert_eq!((like.user_id, like.message_id), (1111, 12345));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
    }
}
