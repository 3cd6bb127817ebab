//! The admin pages for confirming returns and charging overdue fines.

use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        TABLE_CELL_STYLE, TABLE_ROW_STYLE, base, format_currency, format_date,
        format_optional_date, link, table_page,
    },
    navigation::NavBar,
    timezone::local_offset_or_error,
    transaction::{
        Fine, FineAssessment, TransactionId, assess_fine,
        db::{TransactionDetails, confirm_return, get_return_requests, get_transaction_details},
        domain::ConfirmReturnForm,
        state::LendingState,
    },
    user::Role,
};

/// Render the books users want to hand back.
pub async fn get_returns_page(State(state): State<LendingState>) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;

    let requests = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_return_requests(&connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve return requests: {error}"))?
    };

    let rows: Vec<Markup> = requests
        .iter()
        .map(|request| return_request_row(request, local_offset))
        .collect();

    let content = html! {
        (NavBar::new(endpoints::RETURNS_VIEW, Role::Admin).into_html())
        (table_page(
            "Return Requests",
            &["User", "Title", "Issued", "Due", ""],
            &rows,
            "There are no books waiting to be returned.",
        ))
    };

    Ok(base("Return Requests", &content).into_response())
}

fn return_request_row(request: &TransactionDetails, local_offset: UtcOffset) -> Markup {
    let transaction = &request.transaction;
    let return_url = endpoints::format_endpoint(endpoints::RETURN_VIEW, transaction.id);

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (request.username) }
            td class=(TABLE_CELL_STYLE) { (request.book.title) }
            td class=(TABLE_CELL_STYLE) { (format_optional_date(transaction.issue_date, local_offset)) }
            td class=(TABLE_CELL_STYLE) { (format_optional_date(transaction.return_date, local_offset)) }
            td class=(TABLE_CELL_STYLE) { (link(&return_url, "Process return")) }
        }
    }
}

/// Render the overdue fine for a transaction with a form to confirm the return.
///
/// The fine shown is a suggestion, the administrator may change it before confirming.
pub async fn get_return_page(
    State(state): State<LendingState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;

    let details = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transaction_details(transaction_id, &connection)?
    };

    let today = OffsetDateTime::now_utc();
    let assessment = assess_fine(details.transaction.return_date, today);

    let content = html! {
        (NavBar::new(endpoints::RETURNS_VIEW, Role::Admin).into_html())
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-6 text-2xl font-bold" { "Confirm Return" }
            (fine_summary(&details, assessment, today, local_offset))
            (confirm_return_form(details.transaction.id, assessment.fine))
        }
    };

    Ok(base("Confirm Return", &content).into_response())
}

fn fine_summary(
    details: &TransactionDetails,
    assessment: FineAssessment,
    today: OffsetDateTime,
    local_offset: UtcOffset,
) -> Markup {
    let transaction = &details.transaction;
    let items = [
        ("User", details.username.to_string()),
        ("Book", details.book.title.clone()),
        ("Status", transaction.status.label().to_owned()),
        ("Issued", format_optional_date(transaction.issue_date, local_offset)),
        ("Due", format_optional_date(transaction.return_date, local_offset)),
        ("Today", format_date(today, local_offset)),
        ("Late days", assessment.late_days.to_string()),
        ("Suggested fine", format_currency(assessment.fine)),
    ];

    html! {
        dl id="fine-summary" class="w-full mb-6 grid grid-cols-2 gap-2"
        {
            @for (term, description) in items {
                dt class="font-medium" { (term) }
                dd { (description) }
            }
        }
    }
}

fn confirm_return_form(transaction_id: TransactionId, suggested_fine: f64) -> Markup {
    html! {
        form
            hx-post=(endpoints::CONFIRM_RETURN)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            input type="hidden" name="transaction_id" value=(transaction_id);

            div
            {
                label for="fine" class=(FORM_LABEL_STYLE) { "Fine" }

                input
                    id="fine"
                    type="number"
                    name="fine"
                    min="0"
                    step="0.01"
                    value=(suggested_fine)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Confirm Return" }
        }
    }
}

/// Confirm the return in the form, recording the fine the administrator settled on.
pub async fn confirm_return_endpoint(
    State(state): State<LendingState>,
    Form(form): Form<ConfirmReturnForm>,
) -> Response {
    let fine = match Fine::new(form.fine) {
        Ok(fine) => fine,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match confirm_return(
        form.transaction_id,
        fine,
        OffsetDateTime::now_utc(),
        &connection,
    ) {
        Ok(transaction) => {
            tracing::info!(
                "Book {} returned for transaction {} with a fine of {}",
                transaction.book_id,
                transaction.id,
                transaction.fine
            );

            (
                HxRedirect(endpoints::RETURNS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::warn!(
                "Could not confirm return for transaction {}: {error}",
                form.transaction_id
            );

            error.into_alert_response()
        }
    }
}


#[cfg(test)]
mod confirm_return_endpoint_tests {
    use axum::{Form, extract::State, http::StatusCode};
    use time::OffsetDateTime;

    use crate::{
        book::{BookStatus, get_book},
        endpoints,
        test_utils::{assert_hx_redirect, insert_test_book, insert_test_user},
        transaction::{
            TransactionStatus,
            db::{approve_issue, get_transaction, request_issue, request_return},
            domain::ConfirmReturnForm,
            state::{LendingState, get_test_state},
        },
        user::Role,
    };

    use super::confirm_return_endpoint;

    fn insert_return_request(state: &LendingState) -> (i64, i64) {
        let connection = state.db_connection.lock().unwrap();
        let reader = insert_test_user("reader", Role::User, &connection);
        let book = insert_test_book("Kindred", &connection);
        let now = OffsetDateTime::now_utc();
        let transaction = request_issue(reader.id, book.id, now, &connection).unwrap();
        approve_issue(transaction.id, now, &connection).unwrap();
        request_return(transaction.id, reader.id, now, &connection).unwrap();

        (transaction.id, book.id)
    }

    #[tokio::test]
    async fn confirm_return_records_fine_and_frees_book() {
        let state = get_test_state();
        let (transaction_id, book_id) = insert_return_request(&state);

        let response = confirm_return_endpoint(
            State(state.clone()),
            Form(ConfirmReturnForm {
                transaction_id,
                fine: 15.5,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::RETURNS_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(transaction_id, &connection).unwrap();
        assert_eq!(transaction.status, TransactionStatus::Returned);
        assert_eq!(transaction.fine, 15.5);
        assert!(transaction.actual_return_date.is_some());
        assert_eq!(
            get_book(book_id, &connection).unwrap().status,
            BookStatus::Available
        );
    }

    #[tokio::test]
    async fn negative_fine_is_rejected_without_mutation() {
        let state = get_test_state();
        let (transaction_id, book_id) = insert_return_request(&state);

        let response = confirm_return_endpoint(
            State(state.clone()),
            Form(ConfirmReturnForm {
                transaction_id,
                fine: -5.0,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(transaction_id, &connection).unwrap();
        assert_eq!(transaction.status, TransactionStatus::ReturnRequested);
        assert_eq!(transaction.fine, 0.0);
        assert_eq!(get_book(book_id, &connection).unwrap().status, BookStatus::Issued);
    }

    #[tokio::test]
    async fn second_confirmation_is_rejected() {
        let state = get_test_state();
        let (transaction_id, _) = insert_return_request(&state);
        let form = || {
            Form(ConfirmReturnForm {
                transaction_id,
                fine: 0.0,
            })
        };
        confirm_return_endpoint(State(state.clone()), form()).await;

        let response = confirm_return_endpoint(State(state.clone()), form()).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn confirming_unknown_transaction_is_not_found() {
        let state = get_test_state();

        let response = confirm_return_endpoint(
            State(state),
            Form(ConfirmReturnForm {
                transaction_id: 77,
                fine: 0.0,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
