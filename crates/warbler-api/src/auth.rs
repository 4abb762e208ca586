use std::sync::Arc;

use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;
use tracing::{info, warn};

use warbler_crypto::{PasswordError, hash_password, verify_dummy, verify_password};
use warbler_db::models::{NewUser, UserRow};
use warbler_db::{Database, DbError, DbResult};
use warbler_types::api::{Flash, FormPage, LoginForm, SignupForm};
use warbler_types::models::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL};

use crate::error::{AppError, AppResult};
use crate::flash::{Flashes, Page, flash_cookie, redirect, redirect_with_flash};
use crate::middleware::{RequestContext, login_session, logout_session};
use crate::blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub session_secret: String,
    pub session_ttl: chrono::Duration,
}

#[derive(Debug, Error)]
pub enum SignupError {
    /// A required field is missing; nothing was hashed or stored.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Hashing(#[from] PasswordError),
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, SignupError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SignupError::Validation(format!("{field} is required"))),
    }
}

/// Validate and hash a signup. The returned user is not stored yet: the caller
/// commits it with `Database::create_user` and handles a uniqueness conflict there.
pub fn signup(
    username: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
    image_url: Option<&str>,
) -> Result<NewUser, SignupError> {
    let username = required(username, "username")?;
    let email = required(email, "email")?;
    // Passwords are not trimmed; only absence is rejected.
    let password = match password {
        Some(p) if !p.is_empty() => p,
        _ => return Err(SignupError::Validation("password is required".into())),
    };

    let password_hash = hash_password(password)?;

    Ok(NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
        image_url: image_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_IMAGE_URL)
            .to_string(),
        header_image_url: DEFAULT_HEADER_IMAGE_URL.to_string(),
    })
}

/// Look a user up by name and check the password. Unknown user and wrong password
/// both return `None`, and both pay for one hash verification.
pub fn authenticate(db: &Database, username: &str, password: &str) -> DbResult<Option<UserRow>> {
    let Some(user) = db.get_user_by_username(username)? else {
        verify_dummy(password);
        return Ok(None);
    };

    if verify_password(password, &user.password) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

pub async fn signup_form(
    Extension(ctx): Extension<RequestContext>,
    flashes: Flashes,
) -> Page<FormPage> {
    Page::new(
        flashes,
        FormPage {
            form: "signup",
            user: ctx.current_user,
        },
    )
}

/// POST /signup: create the account and log it in.
pub async fn signup_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let signed_up = blocking(move || {
        signup(
            form.username.as_deref(),
            form.email.as_deref(),
            form.password.as_deref(),
            form.image_url.as_deref(),
        )
    })
    .await?;

    let new_user = match signed_up {
        Ok(u) => u,
        Err(SignupError::Validation(msg)) => {
            return Ok(redirect_with_flash("/signup", Flash::danger(msg)));
        }
        Err(e @ SignupError::Hashing(_)) => return Err(AppError::Internal(e.to_string())),
    };

    let st = state.clone();
    let user = match blocking(move || st.db.create_user(&new_user)).await? {
        Ok(user) => user,
        Err(DbError::Conflict { column }) => {
            warn!("Signup rejected: {} already taken", column);
            return Ok(redirect_with_flash(
                "/signup",
                Flash::danger("Username or email already taken"),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    info!("New user signed up: {} (#{})", user.username, user.id);

    let jar = login_session(jar, &state, user.id)?;
    Ok((jar, redirect("/")).into_response())
}

pub async fn login_form(
    Extension(ctx): Extension<RequestContext>,
    flashes: Flashes,
) -> Page<FormPage> {
    Page::new(
        flashes,
        FormPage {
            form: "login",
            user: ctx.current_user,
        },
    )
}

pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let st = state.clone();
    let user = blocking(move || authenticate(&st.db, &form.username, &form.password))
        .await?
        .map_err(AppError::from)?;

    let Some(user) = user else {
        return Ok(redirect_with_flash("/login", Flash::danger("Invalid credentials.")));
    };

    info!("User logged in: {} (#{})", user.username, user.id);

    let jar = login_session(jar, &state, user.id)?
        .add(flash_cookie(&[Flash::success(format!("Hello, {}!", user.username))]));
    Ok((jar, redirect("/")).into_response())
}

pub async fn logout(jar: CookieJar) -> Response {
    let jar = logout_session(jar)
        .add(flash_cookie(&[Flash::success("You have successfully logged out.")]));
    (jar, redirect("/login")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed(db: &Database, name: &str, password: &str) -> UserRow {
        let email = format!("{name}@{name}.com");
        let new = signup(Some(name), Some(&email), Some(password), None).unwrap();
        db.create_user(&new).unwrap()
    }

    #[test]
    fn valid_signup_stores_a_hash() {
        let db = Database::open_in_memory().unwrap();
        let user = committed(&db, "valid", "valid");

        let stored = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(stored.username, "valid");
        assert_eq!(stored.email, "valid@valid.com");
        assert_ne!(stored.password, "valid");
        assert!(stored.password.starts_with("$argon2id$"));
        assert!(verify_password("valid", &stored.password));
        assert_eq!(stored.image_url, DEFAULT_IMAGE_URL);
    }

    #[test]
    fn missing_password_fails_before_the_store() {
        let db = Database::open_in_memory().unwrap();
        let err = signup(Some("testtest"), Some("email@email.com"), None, None).unwrap_err();
        assert!(matches!(err, SignupError::Validation(_)));
        assert_eq!(db.count_users().unwrap(), 0);
    }

    #[test]
    fn missing_username_or_email_is_a_validation_error() {
        assert!(matches!(
            signup(None, Some("valid@valid.com"), Some("valid"), None),
            Err(SignupError::Validation(_))
        ));
        assert!(matches!(
            signup(Some("valid"), Some("  "), Some("valid"), None),
            Err(SignupError::Validation(_))
        ));
    }

    #[test]
    fn duplicate_signup_conflicts_at_commit() {
        let db = Database::open_in_memory().unwrap();
        committed(&db, "test1", "pwd1");

        let dup = signup(Some("test1"), Some("new@new.com"), Some("pwd"), None).unwrap();
        assert!(db.create_user(&dup).unwrap_err().is_conflict());

        let dup = signup(Some("fresh"), Some("test1@test1.com"), Some("pwd"), None).unwrap();
        assert!(db.create_user(&dup).unwrap_err().is_conflict());

        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn custom_image_url_is_kept() {
        let new = signup(Some("a"), Some("a@a.com"), Some("pw"), Some("http://img/a.png")).unwrap();
        assert_eq!(new.image_url, "http://img/a.png");
        assert_eq!(new.header_image_url, DEFAULT_HEADER_IMAGE_URL);
    }

    #[test]
    fn authenticate_matches_lookup_by_id() {
        let db = Database::open_in_memory().unwrap();
        let u1 = committed(&db, "test1", "pwd1");

        let by_id = db.get_user(u1.id).unwrap().unwrap();
        let authed = authenticate(&db, "test1", "pwd1").unwrap().unwrap();
        assert_eq!(authed.id, by_id.id);
        assert_eq!(authed.username, by_id.username);
        assert_eq!(authed.password, by_id.password);
    }

    #[test]
    fn bad_username_and_bad_password_look_the_same() {
        let db = Database::open_in_memory().unwrap();
        committed(&db, "test1", "pwd1");

        assert!(authenticate(&db, "invalid", "pwd1").unwrap().is_none());
        assert!(authenticate(&db, "test1", "invalid").unwrap().is_none());
    }

    #[test]
    fn unknown_user_never_matches_the_placeholder_hash() {
        let db = Database::open_in_memory().unwrap();
        assert!(authenticate(&db, "nobody", "warbler-no-such-user").unwrap().is_none());
        assert!(authenticate(&db, "nobody", "").unwrap().is_none());
    }
}
