#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use warbler_api::auth::{AppState, AppStateInner, signup};
use warbler_api::middleware::{CURR_USER_KEY, issue_session_token};
use warbler_api::router;
use warbler_db::Database;
use warbler_db::models::{MessageRow, UserRow};

const SECRET: &str = "test-secret";

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            session_secret: SECRET.to_string(),
            session_ttl: chrono::Duration::days(1),
        });
        let router = router(state.clone());
        Self { state, router }
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    pub fn signup(&self, username: &str, email: &str, password: &str) -> UserRow {
        let new = signup(Some(username), Some(email), Some(password), None).unwrap();
        self.db().create_user(&new).unwrap()
    }

    pub fn message(&self, user_id: i64, text: &str) -> MessageRow {
        self.db().create_message(user_id, text).unwrap()
    }

    /// Cookie header value for a logged-in `user_id`.
    pub fn session(&self, user_id: i64) -> String {
        let token = issue_session_token(SECRET, user_id, chrono::Duration::days(1)).unwrap();
        format!("{CURR_USER_KEY}={token}")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::get(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::from(form.to_string())).unwrap()).await
    }

    async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Follow a 302 like a browser would: GET the Location, carrying the
    /// request's cookies updated with whatever the response set or cleared.
    pub async fn follow_redirect(&self, res: Response<Body>, cookie: Option<&str>) -> Response<Body> {
        assert_eq!(res.status(), StatusCode::FOUND);
        let location = res.headers()[header::LOCATION].to_str().unwrap().to_string();
        let cookies = merge_cookies(cookie, &res);
        self.get(&location, cookies.as_deref()).await
    }
}

/// Cookie header after applying a response's Set-Cookie headers.
pub fn merge_cookies(cookie: Option<&str>, res: &Response<Body>) -> Option<String> {
    let mut jar: BTreeMap<String, String> = BTreeMap::new();
    for pair in cookie.into_iter().flat_map(|c| c.split("; ")) {
        if let Some((name, value)) = pair.split_once('=') {
            jar.insert(name.to_string(), value.to_string());
        }
    }

    for set_cookie in res.headers().get_all(header::SET_COOKIE) {
        let first = set_cookie.to_str().unwrap().split(';').next().unwrap();
        let (name, value) = first.split_once('=').unwrap();
        if value.is_empty() {
            jar.remove(name);
        } else {
            jar.insert(name.to_string(), value.to_string());
        }
    }

    if jar.is_empty() {
        None
    } else {
        Some(
            jar.into_iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn flash_messages(page: &Value) -> Vec<String> {
    page["flashes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["message"].as_str().unwrap().to_string())
        .collect()
}

pub fn usernames(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect()
}
