use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use warbler_types::models::User;

use crate::auth::AppState;
use crate::error::{AppError, AppResult};
use crate::with_db;

/// Session cookie holding the signed current-user token.
pub const CURR_USER_KEY: &str = "curr_user";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string.
    pub sub: String,
    pub exp: usize,
}

/// Who is making this request. Resolved once per request by `resolve_session`
/// and handed to handlers as an extension.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub current_user: Option<User>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn current_user_id(&self) -> Option<i64> {
        self.current_user.as_ref().map(|u| u.id)
    }

    /// The authenticated user, or `AppError::Unauthorized`.
    pub fn require_user(&self) -> AppResult<&User> {
        self.current_user.as_ref().ok_or_else(|| {
            warn!("Anonymous request to a protected route");
            AppError::Unauthorized
        })
    }
}

pub fn issue_session_token(
    secret: &str,
    user_id: i64,
    ttl: chrono::Duration,
) -> jsonwebtoken::errors::Result<String> {
    let expires = chrono::Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expires.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode a session token into a user id. Any failure means "no session".
pub fn session_user_id(secret: &str, token: &str) -> Option<i64> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| debug!("Rejected session token: {}", e))
    .ok()?;

    data.claims.sub.parse().ok()
}

/// Add the session cookie for `user_id` to the jar.
pub fn login_session(jar: CookieJar, state: &AppState, user_id: i64) -> AppResult<CookieJar> {
    let token = issue_session_token(&state.session_secret, user_id, state.session_ttl)
        .map_err(|e| AppError::Internal(format!("session token: {e}")))?;

    let cookie = Cookie::build((CURR_USER_KEY, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok(jar.add(cookie))
}

pub fn logout_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(CURR_USER_KEY).path("/"))
}

/// Resolve the session cookie into a `RequestContext`. A missing cookie, a bad
/// token, and an id whose user no longer exists all resolve to anonymous.
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = jar
        .get(CURR_USER_KEY)
        .and_then(|c| session_user_id(&state.session_secret, c.value()));

    let ctx = match user_id {
        Some(id) => {
            let user = with_db(&state, move |db| db.get_user(id)).await?;
            if user.is_none() {
                debug!("Session refers to missing user {}", id);
            }
            RequestContext {
                current_user: user.map(User::from),
            }
        }
        None => RequestContext::anonymous(),
    };

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
