//! Expense tracker is a small REST API for recording and summarising personal
//! expenses.
//!
//! Users sign up and log in to receive a JSON Web Token, which they send as a
//! bearer token to create, list, update and delete their expenses. Expenses
//! can be filtered by a trailing period, an explicit date range and a
//! category, and summarised per category.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod extract;
mod logging;
mod not_found;
mod password;
mod routing;
mod timezone;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, DEFAULT_TOKEN_DURATION, TokenKeys};
pub use auth::{
    AccessToken, Claims, CurrentUser, LogInForm, SignUpForm, decode_token, encode_token,
};
pub use db::initialize as initialize_db;
pub use expense::{
    Amount, CategorySummary, CreateExpenseForm, EditExpenseForm, Expense, ExpenseCategory,
    ExpenseFilter, ExpenseSummary, ExpenseUpdate, MAX_DESCRIPTION_LENGTH, NewExpense, Period,
    create_expense, delete_expense, get_expense, query_expenses, summarize, update_expense,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{Email, User, UserID, Username, authenticate, create_user};

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

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A field in the request had the right type but an invalid value, e.g. a
    /// negative amount or a username that is too short.
    #[error("invalid value for \"{field}\": {message}")]
    Validation {
        /// The name of the offending field.
        field: &'static str,
        /// A human readable description of what is wrong with the field.
        message: String,
    },

    /// The request body could not be decoded as the expected JSON document.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The query string could not be decoded into the expected parameters.
    #[error("invalid query parameters: {0}")]
    InvalidQuery(String),

    /// A path parameter, such as an expense ID, could not be parsed.
    #[error("invalid path parameter: {0}")]
    InvalidPath(String),

    /// The bearer token is missing, malformed, expired, has an invalid
    /// signature, or refers to a user that no longer exists.
    #[error("could not validate credentials")]
    Unauthenticated,

    /// The user provided an unknown login or a password that does not match.
    ///
    /// The two cases share one error so clients cannot probe for registered
    /// users.
    #[error("incorrect username, email or password")]
    InvalidCredentials,

    /// The requested resource was not found.
    ///
    /// This error is also returned when the resource exists but belongs to
    /// another user so that clients cannot learn about other users' data.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The email used to sign up is already registered.
    #[error("the email is already registered")]
    DuplicateEmail,

    /// The username used to sign up is already taken.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The JSON Web Token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.ends_with("user.email") => Error::DuplicateEmail,
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.ends_with("user.username") => Error::DuplicateUsername,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. }
            | Error::InvalidBody(_)
            | Error::InvalidQuery(_)
            | Error::InvalidPath(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Unauthenticated | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateEmail | Error::DuplicateUsername => StatusCode::CONFLICT,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_)
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            Error::Validation { field, message } => json!({
                "error": "validation error",
                "detail": { "field": field, "message": message },
            }),
            Error::InvalidBody(detail) | Error::InvalidQuery(detail) | Error::InvalidPath(detail) => {
                json!({
                    "error": "validation error",
                    "detail": detail,
                })
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error if status.is_server_error() => {
                tracing::error!("An unexpected error occurred: {}", error);
                json!({ "error": "internal server error" })
            }
            error => json!({ "error": error.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();

        if matches!(self, Error::Unauthenticated) {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}
