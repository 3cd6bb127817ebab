//! The admin page for approving issue requests.

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error, endpoints,
    html::{BUTTON_SMALL_STYLE, TABLE_CELL_STYLE, TABLE_ROW_STYLE, base, format_date, table_page},
    navigation::NavBar,
    timezone::local_offset_or_error,
    transaction::{
        db::{TransactionDetails, approve_issue, get_pending_requests},
        domain::TransactionForm,
        state::LendingState,
    },
    user::Role,
};

/// Render the issue requests waiting for approval.
pub async fn get_pending_page(State(state): State<LendingState>) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;

    let requests = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_pending_requests(&connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve pending requests: {error}"))?
    };

    let rows: Vec<Markup> = requests
        .iter()
        .map(|request| pending_row(request, local_offset))
        .collect();

    let content = html! {
        (NavBar::new(endpoints::PENDING_VIEW, Role::Admin).into_html())
        (table_page(
            "Pending Requests",
            &["User", "Title", "Author", "Requested", ""],
            &rows,
            "There are no requests waiting for approval.",
        ))
    };

    Ok(base("Pending Requests", &content).into_response())
}

fn pending_row(request: &TransactionDetails, local_offset: UtcOffset) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (request.username) }
            td class=(TABLE_CELL_STYLE) { (request.book.title) }
            td class=(TABLE_CELL_STYLE) { (request.book.author) }
            td class=(TABLE_CELL_STYLE) { (format_date(request.transaction.created_at, local_offset)) }
            td class=(TABLE_CELL_STYLE)
            {
                form
                    hx-post=(endpoints::APPROVE_ISSUE)
                    hx-target-error="#alert-container"
                {
                    input type="hidden" name="transaction_id" value=(request.transaction.id);
                    button type="submit" class=(BUTTON_SMALL_STYLE) { "Approve" }
                }
            }
        }
    }
}

/// Issue the book of the pending transaction in the form.
pub async fn approve_issue_endpoint(
    State(state): State<LendingState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match approve_issue(form.transaction_id, OffsetDateTime::now_utc(), &connection) {
        Ok(transaction) => {
            tracing::info!(
                "Issued book {} for transaction {}",
                transaction.book_id,
                transaction.id
            );

            (
                HxRedirect(endpoints::PENDING_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::warn!(
                "Could not approve transaction {}: {error}",
                form.transaction_id
            );

            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod pending_page_tests {
    use axum::{extract::State, http::StatusCode};
    use scraper::Selector;
    use time::OffsetDateTime;

    use crate::{
        endpoints,
        test_utils::{
            assert_hx_endpoint, assert_valid_html, insert_test_book, insert_test_user,
            parse_html_document,
        },
        transaction::{
            db::{approve_issue, request_issue},
            state::get_test_state,
        },
        user::Role,
    };

    use super::get_pending_page;

    #[tokio::test]
    async fn lists_only_pending_requests_with_approve_forms() {
        let state = get_test_state();
        let pending_id = {
            let connection = state.db_connection.lock().unwrap();
            let reader = insert_test_user("reader", Role::User, &connection);
            let kindred = insert_test_book("Kindred", &connection);
            let beloved = insert_test_book("Beloved", &connection);
            let now = OffsetDateTime::now_utc();
            let pending = request_issue(reader.id, kindred.id, now, &connection).unwrap();
            let issued = request_issue(reader.id, beloved.id, now, &connection).unwrap();
            approve_issue(issued.id, now, &connection).unwrap();
            pending.id
        };

        let response = get_pending_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let rows: Vec<_> = html
            .select(&Selector::parse("tbody tr").unwrap())
            .collect();
        assert_eq!(rows.len(), 1);
        let row_text = rows[0].text().collect::<String>();
        assert!(row_text.contains("reader"));
        assert!(row_text.contains("Kindred"));

        let form = html
            .select(&Selector::parse("form").unwrap())
            .next()
            .expect("No approve form");
        assert_hx_endpoint(&form, endpoints::APPROVE_ISSUE, "hx-post");
        let transaction_id = form
            .select(&Selector::parse("input[name=transaction_id]").unwrap())
            .next()
            .and_then(|input| input.value().attr("value"));
        assert_eq!(transaction_id, Some(pending_id.to_string().as_str()));
    }
}
