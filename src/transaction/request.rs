//! Endpoints for users to ask for a book and to hand it back.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use time::OffsetDateTime;

use crate::{
    Error,
    auth::Session,
    endpoints,
    transaction::{
        db::{request_issue, request_return},
        domain::{BookRequestForm, TransactionForm},
        state::LendingState,
    },
};

/// Ask for the book in the form to be issued to the logged in user.
pub async fn request_issue_endpoint(
    State(state): State<LendingState>,
    Extension(session): Extension<Session>,
    Form(form): Form<BookRequestForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match request_issue(
        session.user_id,
        form.book_id,
        OffsetDateTime::now_utc(),
        &connection,
    ) {
        Ok(transaction) => {
            tracing::info!(
                "User {} requested book {} in transaction {}",
                session.user_id,
                form.book_id,
                transaction.id
            );

            (
                HxRedirect(endpoints::MY_BOOKS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            if !matches!(error, Error::DuplicateRequest | Error::BookNotFound) {
                tracing::error!("An unexpected error occurred while requesting a book: {error}");
            }

            error.into_alert_response()
        }
    }
}

/// Ask to return the issued book in the form's transaction.
pub async fn request_return_endpoint(
    State(state): State<LendingState>,
    Extension(session): Extension<Session>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match request_return(
        form.transaction_id,
        session.user_id,
        OffsetDateTime::now_utc(),
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::MY_BOOKS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::InvalidReturnRequest) => {
            tracing::warn!(
                "User {} made an invalid return request for transaction {}",
                session.user_id,
                form.transaction_id
            );
            Error::InvalidReturnRequest.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while requesting a return: {error}");
            error.into_alert_response()
        }
    }
}
