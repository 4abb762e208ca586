use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};
use warbler_db::DbError;
use warbler_types::api::Flash;

use crate::flash::redirect_with_flash;

pub type AppResult<T> = Result<T, AppError>;

/// Where rejected visitors are sent.
pub const UNAUTHORIZED_REDIRECT: &str = "/";

#[derive(Debug, Error)]
pub enum AppError {
    /// Anonymous on a protected route, or not the owner. Rendered as a redirect, never an error page.
    #[error("Access unauthorized.")]
    Unauthorized,

    /// Authenticated but the action is not allowed; the message is shown to the user.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{column} already taken")]
    Conflict { column: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::Forbidden(_) => StatusCode::FOUND,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict { .. } => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized | Self::Forbidden(_) => {
                redirect_with_flash(UNAUTHORIZED_REDIRECT, Flash::danger(self.to_string()))
            }
            _ => {
                let status = self.status_code();
                let code = self.error_code();

                if status.is_server_error() {
                    error!(error = %self, code = code, "Server error occurred");
                } else {
                    debug!(error = %self, code = code, "Client error occurred");
                }

                let body = Json(json!({
                    "flashes": [],
                    "error": {
                        "code": code,
                        "message": self.to_string(),
                    }
                }));

                (status, body).into_response()
            }
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(msg) => Self::Validation(msg),
            DbError::Conflict { column } => Self::Conflict { column },
            DbError::NotFound(what) => Self::NotFound(what),
            DbError::LockPoisoned | DbError::Sqlite(_) => Self::Internal(err.to_string()),
        }
    }
}
