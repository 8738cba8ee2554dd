//! Savings is a web app for tracking monthly expenses and savings.
//!
//! Users register and log in, enter their income and monthly expenses for the
//! current year, and get a chart of their expenses, monthly savings and
//! accumulated savings. This library provides the HTTP API and the HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use serde_json::json;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod chart;
mod db;
mod endpoints;
mod expense;
mod html;
mod logging;
mod not_found;
mod password;
mod routing;
mod savings;
mod timezone;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID, get_user_by_username, update_password};

use crate::not_found::NOT_FOUND_MESSAGE;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// A problem with a single field of a submitted form or JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// The name of the offending field as the client sent it, e.g. "lastName".
    pub field: &'static str,
    /// A human readable explanation of the problem.
    pub message: String,
}

impl FieldError {
    /// Create a field error for `field`.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more fields in the request were missing or malformed.
    #[error("invalid request: {0:?}")]
    Validation(Vec<FieldError>),

    /// The username used for registration already belongs to another user.
    #[error("the username already exists")]
    DuplicateUsername,

    /// The username is unknown or the password does not match.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The request has no live session, or the session's user no longer exists.
    #[error("the request is not authenticated")]
    Unauthorized,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// A date time could not be created or formatted, e.g. a session expiry.
    #[error("invalid date time: {0}")]
    InvalidDateTime(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

/// The name reported in [FieldError::field] when the request body as a whole
/// could not be read, e.g. a field has the wrong type.
pub const BODY_FIELD: &str = "body";

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(vec![FieldError::new(BODY_FIELD, rejection.body_text())])
    }
}

impl From<FormRejection> for Error {
    fn from(rejection: FormRejection) -> Self {
        Error::Validation(vec![FieldError::new(BODY_FIELD, rejection.body_text())])
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("users.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            Error::DuplicateUsername => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Username already exists" })),
            )
                .into_response(),
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid username or password" })),
            )
                .into_response(),
            Error::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Unauthorized" })),
            )
                .into_response(),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": NOT_FOUND_MESSAGE })),
            )
                .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}
