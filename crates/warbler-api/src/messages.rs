use axum::{
    Extension, Form,
    extract::{Path, State},
    response::Response,
};
use tracing::{info, warn};

use warbler_db::models::MessageRow;
use warbler_db::{Database, DbError, DbResult};
use warbler_types::api::{Flash, FormPage, MessageForm, MessagePage, MessageResponse};

use crate::auth::AppState;
use crate::error::{AppError, AppResult};
use crate::flash::{Flashes, Page, redirect, redirect_with_flash};
use crate::middleware::RequestContext;
use crate::{blocking, with_db};

/// Home timeline and profile pages show at most this many messages.
pub const PAGE_LIMIT: u32 = 100;

fn to_response(row: MessageRow, like_count: usize) -> MessageResponse {
    MessageResponse {
        id: row.id,
        timestamp: row.created_at(),
        text: row.text,
        user_id: row.user_id,
        author_username: row.author_username,
        author_image_url: row.author_image_url,
        like_count,
    }
}

/// Render rows with their like counts (one batched count query).
pub(crate) fn message_responses(
    db: &Database,
    rows: Vec<MessageRow>,
) -> DbResult<Vec<MessageResponse>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let counts = db.like_counts(&ids)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let likes = counts.get(&row.id).copied().unwrap_or(0);
            to_response(row, likes)
        })
        .collect())
}

/// GET /messages/{id}: public.
pub async fn show_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    flashes: Flashes,
) -> AppResult<Page<MessagePage>> {
    let message = with_db(&state, move |db| {
        let Some(row) = db.get_message(message_id)? else {
            return Err(DbError::NotFound("message"));
        };
        let likes = db.count_likes(row.id)?;
        Ok(to_response(row, likes))
    })
    .await?;

    Ok(Page::new(flashes, MessagePage { message }))
}

pub async fn new_message_form(
    Extension(ctx): Extension<RequestContext>,
    flashes: Flashes,
) -> AppResult<Page<FormPage>> {
    let user = ctx.require_user()?.clone();
    Ok(Page::new(
        flashes,
        FormPage {
            form: "message",
            user: Some(user),
        },
    ))
}

/// POST /messages/new: post as the current user.
pub async fn create_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<MessageForm>,
) -> AppResult<Response> {
    let user_id = ctx.require_user()?.id;

    let st = state.clone();
    let text = form.text.unwrap_or_default();
    match blocking(move || st.db.create_message(user_id, &text)).await? {
        Ok(message) => {
            info!("User #{} posted message #{}", user_id, message.id);
            Ok(redirect(&format!("/users/{user_id}")))
        }
        Err(DbError::Validation(msg)) => Ok(redirect_with_flash("/messages/new", Flash::danger(msg))),
        Err(e) => Err(e.into()),
    }
}

/// POST /messages/{id}/delete: owner only. Anyone else gets the unauthorized
/// redirect and the message stays.
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(message_id): Path<i64>,
) -> AppResult<Response> {
    let user_id = ctx.require_user()?.id;

    let message = with_db(&state, move |db| db.get_message(message_id))
        .await?
        .ok_or(AppError::NotFound("message"))?;

    if message.user_id != user_id {
        warn!(
            "User #{} tried to delete message #{} owned by #{}",
            user_id, message_id, message.user_id
        );
        return Err(AppError::Unauthorized);
    }

    with_db(&state, move |db| db.delete_message(message_id)).await?;
    info!("User #{} deleted message #{}", user_id, message_id);

    Ok(redirect(&format!("/users/{user_id}")))
}
