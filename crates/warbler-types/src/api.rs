use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;

// -- Forms --

/// Signup form. Every field is optional at the wire level so a missing
/// value reaches validation instead of failing deserialization.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SignupForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// A missing `text` is treated like empty text, so it reaches validation.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MessageForm {
    pub text: Option<String>,
}

/// Profile edit form. `password` must match the current user's password; a
/// missing one is a mismatch.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ProfileForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    pub q: Option<String>,
}

// -- Flash --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { category: FlashCategory::Success, message: message.into() }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self { category: FlashCategory::Danger, message: message.into() }
    }
}

// -- Page bodies --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub author_username: String,
    pub author_image_url: String,
    pub like_count: usize,
}

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub user: Option<User>,
    pub messages: Vec<MessageResponse>,
    pub liked_message_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct FormPage {
    pub form: &'static str,
    pub user: Option<User>,
}

#[derive(Debug, Serialize)]
pub struct MessagePage {
    pub message: MessageResponse,
}

#[derive(Debug, Serialize)]
pub struct UserListPage {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub user: User,
    pub messages: Vec<MessageResponse>,
    pub message_count: usize,
    pub following_count: usize,
    pub followers_count: usize,
    pub likes_count: usize,
    /// Whether the viewer follows this user.
    pub is_following: bool,
}

#[derive(Debug, Serialize)]
pub struct FollowListPage {
    pub user: User,
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct LikesPage {
    pub user: User,
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Serialize)]
pub struct NotFoundPage {
    pub error: &'static str,
}
