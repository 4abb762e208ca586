use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use warbler_types::api::{HomePage, NotFoundPage};

use crate::auth::AppState;
use crate::error::AppResult;
use crate::flash::{Flashes, Page};
use crate::messages::{PAGE_LIMIT, message_responses};
use crate::middleware::RequestContext;
use crate::with_db;

/// GET /: the timeline for a logged-in user, an empty landing page otherwise.
pub async fn home(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    flashes: Flashes,
) -> AppResult<Page<HomePage>> {
    let Some(user) = ctx.current_user else {
        return Ok(Page::new(
            flashes,
            HomePage {
                user: None,
                messages: vec![],
                liked_message_ids: vec![],
            },
        ));
    };

    let user_id = user.id;
    let (messages, liked_message_ids) = with_db(&state, move |db| {
        let rows = db.timeline(user_id, PAGE_LIMIT)?;
        Ok((message_responses(db, rows)?, db.liked_message_ids(user_id)?))
    })
    .await?;

    Ok(Page::new(
        flashes,
        HomePage {
            user: Some(user),
            messages,
            liked_message_ids,
        },
    ))
}

pub async fn not_found(flashes: Flashes) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Page::new(flashes, NotFoundPage { error: "Page not found" }),
    )
}
