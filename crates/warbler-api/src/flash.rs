//! One-shot user notices carried across a redirect in a cookie, and the JSON
//! page envelope that displays (and consumes) them.

use std::convert::Infallible;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use serde::Serialize;
use warbler_types::api::Flash;

pub const FLASH_COOKIE: &str = "flash";

pub fn encode_flashes(flashes: &[Flash]) -> String {
    let json = serde_json::to_vec(flashes).unwrap_or_default();
    B64.encode(json)
}

/// Unreadable cookie contents decode to no flashes.
pub fn decode_flashes(raw: &str) -> Vec<Flash> {
    B64.decode(raw)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

pub fn flash_cookie(flashes: &[Flash]) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, encode_flashes(flashes)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn cleared_flash_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((FLASH_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie
}

/// A plain 302 redirect.
pub fn redirect(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}

pub fn redirect_with_flash(to: &str, flash: Flash) -> Response {
    let jar = CookieJar::new().add(flash_cookie(&[flash]));
    (jar, redirect(to)).into_response()
}

/// Flashes waiting in the request's cookie.
#[derive(Debug, Default)]
pub struct Flashes(pub Vec<Flash>);

impl<S> FromRequestParts<S> for Flashes
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(Self(
            jar.get(FLASH_COOKIE)
                .map(|c| decode_flashes(c.value()))
                .unwrap_or_default(),
        ))
    }
}

/// A rendered page: `{ "flashes": [...], ...body }`. Rendering clears the flash cookie.
pub struct Page<T> {
    flashes: Vec<Flash>,
    body: T,
}

impl<T> Page<T> {
    pub fn new(flashes: Flashes, body: T) -> Self {
        Self {
            flashes: flashes.0,
            body,
        }
    }
}

#[derive(Serialize)]
struct PageBody<'a, T> {
    flashes: &'a [Flash],
    #[serde(flatten)]
    body: &'a T,
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        let json = Json(PageBody {
            flashes: &self.flashes,
            body: &self.body,
        });

        if self.flashes.is_empty() {
            json.into_response()
        } else {
            (CookieJar::new().add(cleared_flash_cookie()), json).into_response()
        }
    }
}
