use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use warbler_db::models::UserUpdate;
use warbler_db::{Database, DbError, DbResult};
use warbler_types::api::{
    Flash, FollowListPage, FormPage, LikesPage, ProfileForm, ProfilePage, UserListPage,
    UserSearchQuery,
};
use warbler_types::models::User;

use crate::auth::{AppState, authenticate};
use crate::error::{AppError, AppResult};
use crate::flash::{Flashes, Page, redirect, redirect_with_flash};
use crate::messages::{PAGE_LIMIT, message_responses};
use crate::middleware::{RequestContext, logout_session};
use crate::{blocking, with_db};

fn load_user(db: &Database, user_id: i64) -> DbResult<User> {
    db.get_user(user_id)?
        .map(User::from)
        .ok_or(DbError::NotFound("user"))
}

/// GET /users: public directory, filtered by `?q=`.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
    flashes: Flashes,
) -> AppResult<Page<UserListPage>> {
    let search = query.q.filter(|q| !q.trim().is_empty());
    let users = with_db(&state, move |db| db.list_users(search.as_deref())).await?;

    Ok(Page::new(
        flashes,
        UserListPage {
            users: users.into_iter().map(User::from).collect(),
        },
    ))
}

/// GET /users/{id}: profile with recent messages and counts.
pub async fn show_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<i64>,
    flashes: Flashes,
) -> AppResult<Page<ProfilePage>> {
    let viewer_id = ctx.require_user()?.id;

    let page = with_db(&state, move |db| {
        let user = load_user(db, user_id)?;
        let rows = db.list_messages_by_user(user_id, PAGE_LIMIT)?;
        Ok(ProfilePage {
            user,
            messages: message_responses(db, rows)?,
            message_count: db.count_messages_by_user(user_id)?,
            following_count: db.list_following(user_id)?.len(),
            followers_count: db.list_followers(user_id)?.len(),
            likes_count: db.liked_message_ids(user_id)?.len(),
            is_following: db.is_following(viewer_id, user_id)?,
        })
    })
    .await?;

    Ok(Page::new(flashes, page))
}

pub async fn followers(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<i64>,
    flashes: Flashes,
) -> AppResult<Page<FollowListPage>> {
    ctx.require_user()?;

    let page = with_db(&state, move |db| {
        Ok(FollowListPage {
            user: load_user(db, user_id)?,
            users: db.list_followers(user_id)?.into_iter().map(User::from).collect(),
        })
    })
    .await?;

    Ok(Page::new(flashes, page))
}

pub async fn following(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<i64>,
    flashes: Flashes,
) -> AppResult<Page<FollowListPage>> {
    ctx.require_user()?;

    let page = with_db(&state, move |db| {
        Ok(FollowListPage {
            user: load_user(db, user_id)?,
            users: db.list_following(user_id)?.into_iter().map(User::from).collect(),
        })
    })
    .await?;

    Ok(Page::new(flashes, page))
}

/// GET /users/{id}/likes: messages the user has liked.
pub async fn likes(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<i64>,
    flashes: Flashes,
) -> AppResult<Page<LikesPage>> {
    ctx.require_user()?;

    let page = with_db(&state, move |db| {
        let user = load_user(db, user_id)?;
        let rows = db.list_liked_messages(user_id)?;
        Ok(LikesPage {
            user,
            messages: message_responses(db, rows)?,
        })
    })
    .await?;

    Ok(Page::new(flashes, page))
}

pub async fn follow(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(followed_id): Path<i64>,
) -> AppResult<Response> {
    let user_id = ctx.require_user()?.id;

    let st = state.clone();
    match blocking(move || st.db.follow(user_id, followed_id)).await? {
        Ok(added) => {
            if added {
                info!("User #{} followed #{}", user_id, followed_id);
            }
            Ok(redirect(&format!("/users/{user_id}/following")))
        }
        Err(DbError::Validation(_)) => {
            Err(AppError::Forbidden("You cannot follow yourself.".into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn stop_following(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(followed_id): Path<i64>,
) -> AppResult<Response> {
    let user_id = ctx.require_user()?.id;

    if with_db(&state, move |db| db.unfollow(user_id, followed_id)).await? {
        info!("User #{} stopped following #{}", user_id, followed_id);
    }

    Ok(redirect(&format!("/users/{user_id}/following")))
}

pub async fn edit_profile(
    Extension(ctx): Extension<RequestContext>,
    flashes: Flashes,
) -> AppResult<Page<FormPage>> {
    let user = ctx.require_user()?.clone();
    Ok(Page::new(
        flashes,
        FormPage {
            form: "profile",
            user: Some(user),
        },
    ))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /users/profile: edit the current user's profile. The current password
/// must be re-entered.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    let user = ctx.require_user()?.clone();

    let st = state.clone();
    let username = user.username.clone();
    let password = form.password.clone().unwrap_or_default();
    let verified = blocking(move || authenticate(&st.db, &username, &password))
        .await?
        .map_err(AppError::from)?;

    if verified.is_none() {
        return Ok(redirect_with_flash(
            "/",
            Flash::danger("Wrong password, please try again."),
        ));
    }

    let update = UserUpdate {
        username: non_empty(form.username),
        email: non_empty(form.email),
        image_url: non_empty(form.image_url),
        header_image_url: non_empty(form.header_image_url),
        bio: form.bio.map(|b| b.trim().to_string()),
        location: form.location.map(|l| l.trim().to_string()),
    };

    let st = state.clone();
    let user_id = user.id;
    match blocking(move || st.db.update_user(user_id, &update)).await? {
        Ok(_) => {
            info!("User #{} updated their profile", user_id);
            Ok(redirect_with_flash(
                &format!("/users/{user_id}"),
                Flash::success("Profile updated."),
            ))
        }
        Err(DbError::Conflict { column }) => Ok(redirect_with_flash(
            "/users/profile",
            Flash::danger(format!("That {column} is already taken.")),
        )),
        Err(e) => Err(e.into()),
    }
}

/// POST /users/delete: remove the current user and everything hanging off them.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    jar: CookieJar,
) -> AppResult<Response> {
    let user_id = ctx.require_user()?.id;

    with_db(&state, move |db| db.delete_user(user_id)).await?;
    info!("User #{} deleted their account", user_id);

    Ok((logout_session(jar), redirect("/signup")).into_response())
}
