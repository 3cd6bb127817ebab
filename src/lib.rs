//! Library is a web app for lending books.
//!
//! Users browse the catalog, request books and hand them back. Administrators
//! approve requests, confirm returns and record overdue fines.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod book;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod password;
mod routing;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use book::{Book, BookId, BookStatus, NewBook, create_book};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use transaction::{
    DAILY_FINE, Fine, FineAssessment, LOAN_PERIOD, Transaction, TransactionId, TransactionStatus,
    assess_fine,
};
pub use user::{Role, User, UserID, Username, create_user, get_user_by_id, get_user_by_username};

use crate::{
    alert::Alert, internal_server_error::InternalServerError, not_found::get_404_not_found_response,
};

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
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth token in the cookie has expired.
    #[error("the session has expired")]
    SessionExpired,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty string was used for a username.
    #[error("Username cannot be empty")]
    EmptyUsername,

    /// The username is already taken by another account.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// An empty string was used for a book title or author.
    #[error("{0} cannot be empty")]
    EmptyBookField(&'static str),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The book ID does not refer to a book in the catalog.
    #[error("the book could not be found")]
    BookNotFound,

    /// The transaction ID does not refer to a recorded transaction.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// The book is already issued to someone else.
    #[error("This book is already issued")]
    BookUnavailable,

    /// The user already has a pending or issued transaction for the book.
    #[error("You already requested or issued this book")]
    DuplicateRequest,

    /// The transaction is not issued to the user asking to return it.
    #[error("Invalid return request")]
    InvalidReturnRequest,

    /// The transaction's current status does not allow the requested transition.
    #[error("cannot change a {from} transaction to {to}")]
    InvalidTransition {
        /// The status the transaction is currently in.
        from: TransactionStatus,
        /// The status the caller tried to move the transaction to.
        to: TransactionStatus,
    },

    /// A fine must be a finite amount that is zero or more.
    #[error("{0} is not a valid fine, fines must be zero or more")]
    InvalidFine(f64),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067
                    && desc.contains("transaction.user_id, transaction.book_id") =>
            {
                Error::DuplicateRequest
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
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
            Error::NotFound => get_404_not_found_response(),
            Error::TransactionNotFound | Error::BookNotFound => (
                StatusCode::NOT_FOUND,
                html::error_view(
                    "Not Found",
                    "404",
                    &self.to_string(),
                    "Check the link you followed and try again.",
                ),
            )
                .into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::TransactionNotFound => Alert::Error {
                message: "Transaction not found".to_owned(),
                details: "The transaction could not be found. \
                    Try refreshing the page to see its latest status."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::BookNotFound => Alert::Error {
                message: "Book not found".to_owned(),
                details: "The book could not be found in the catalog.".to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::BookUnavailable => Alert::Error {
                message: Error::BookUnavailable.to_string(),
                details: "The book must be returned before it can be issued again.".to_owned(),
            }
            .into_response_with_status(StatusCode::CONFLICT),
            Error::DuplicateRequest => Alert::ErrorSimple {
                message: Error::DuplicateRequest.to_string(),
            }
            .into_response_with_status(StatusCode::CONFLICT),
            Error::InvalidReturnRequest => Alert::ErrorSimple {
                message: Error::InvalidReturnRequest.to_string(),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::InvalidTransition { from, to } => Alert::Error {
                message: "Invalid transaction update".to_owned(),
                details: format!(
                    "The transaction is {from} and cannot be changed to {to}. \
                    Try refreshing the page to see its latest status."
                ),
            }
            .into_response_with_status(StatusCode::CONFLICT),
            Error::InvalidFine(fine) => Alert::Error {
                message: "Invalid fine".to_owned(),
                details: format!("{fine} is not a valid fine. Enter an amount of zero or more."),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::InvalidTimezoneError(timezone) => Alert::Error {
                message: "Invalid Timezone Settings".to_owned(),
                details: format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
            _ => Alert::Error {
                message: "Something went wrong".to_owned(),
                details: "An unexpected error occurred, check the server logs for more details."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}
