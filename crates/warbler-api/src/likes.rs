use axum::{
    Extension,
    extract::{Path, State},
    response::Response,
};
use tracing::info;

use crate::auth::AppState;
use crate::error::{AppError, AppResult};
use crate::flash::redirect;
use crate::middleware::RequestContext;
use crate::with_db;

/// POST /messages/{id}/like: like the message, or unlike it if already liked.
/// Liking your own message is refused.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(message_id): Path<i64>,
) -> AppResult<Response> {
    let user_id = ctx.require_user()?.id;

    let message = with_db(&state, move |db| db.get_message(message_id))
        .await?
        .ok_or(AppError::NotFound("message"))?;

    if message.user_id == user_id {
        return Err(AppError::Forbidden("You cannot like your own message.".into()));
    }

    let added = with_db(&state, move |db| db.toggle_like(user_id, message_id)).await?;
    info!(
        "User #{} {} message #{}",
        user_id,
        if added { "liked" } else { "unliked" },
        message_id
    );

    Ok(redirect("/"))
}
