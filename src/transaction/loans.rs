//! The pages where users see the books they requested and borrowed.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::UtcOffset;

use crate::{
    Error,
    auth::Session,
    endpoints,
    html::{
        BUTTON_SMALL_STYLE, STATUS_BADGE_STYLE, TABLE_CELL_STYLE, TABLE_ROW_STYLE, base,
        format_currency, format_date, format_optional_date, table_page,
    },
    navigation::NavBar,
    timezone::local_offset_or_error,
    transaction::{
        TransactionStatus,
        db::{TransactionOrder, TransactionWithBook, get_user_transactions},
        state::LendingState,
    },
};

/// Render the logged in user's transactions, oldest first, with a button to
/// return each issued book.
pub async fn get_my_books_page(
    State(state): State<LendingState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let transactions = load_transactions(&state, session, TransactionOrder::OldestFirst)?;

    let rows: Vec<Markup> = transactions
        .iter()
        .map(|row| my_books_row(row, local_offset))
        .collect();

    let content = html! {
        (NavBar::new(endpoints::MY_BOOKS_VIEW, session.role).into_html())
        (table_page(
            "My Books",
            &["Title", "Author", "Status", "Issued", "Due", ""],
            &rows,
            "You have not requested any books yet.",
        ))
    };

    Ok(base("My Books", &content).into_response())
}

/// Render a report of all the logged in user's transactions, newest first.
pub async fn get_my_reports_page(
    State(state): State<LendingState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let transactions = load_transactions(&state, session, TransactionOrder::NewestFirst)?;

    let rows: Vec<Markup> = transactions
        .iter()
        .map(|row| report_row(row, local_offset))
        .collect();

    let content = html! {
        (NavBar::new(endpoints::MY_REPORTS_VIEW, session.role).into_html())
        (table_page(
            "My Reports",
            &["Title", "Status", "Requested", "Issued", "Due", "Returned", "Fine"],
            &rows,
            "You have no transactions yet.",
        ))
    };

    Ok(base("My Reports", &content).into_response())
}

fn load_transactions(
    state: &LendingState,
    session: Session,
    order: TransactionOrder,
) -> Result<Vec<TransactionWithBook>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_transactions(session.user_id, order, &connection).inspect_err(|error| {
        tracing::error!(
            "Failed to retrieve transactions for user {}: {error}",
            session.user_id
        )
    })
}

fn my_books_row(row: &TransactionWithBook, local_offset: UtcOffset) -> Markup {
    let transaction = &row.transaction;

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (row.book.title) }
            td class=(TABLE_CELL_STYLE) { (row.book.author) }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(STATUS_BADGE_STYLE) { (transaction.status.label()) }
            }
            td class=(TABLE_CELL_STYLE) { (format_optional_date(transaction.issue_date, local_offset)) }
            td class=(TABLE_CELL_STYLE) { (format_optional_date(transaction.return_date, local_offset)) }
            td class=(TABLE_CELL_STYLE)
            {
                @if transaction.status == TransactionStatus::Issued {
                    form
                        hx-post=(endpoints::REQUEST_RETURN)
                        hx-target-error="#alert-container"
                    {
                        input type="hidden" name="transaction_id" value=(transaction.id);
                        button type="submit" class=(BUTTON_SMALL_STYLE) { "Return" }
                    }
                }
            }
        }
    }
}

fn report_row(row: &TransactionWithBook, local_offset: UtcOffset) -> Markup {
    let transaction = &row.transaction;

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (row.book.title) }
            td class=(TABLE_CELL_STYLE) { (transaction.status.label()) }
            td class=(TABLE_CELL_STYLE) { (format_date(transaction.created_at, local_offset)) }
            td class=(TABLE_CELL_STYLE) { (format_optional_date(transaction.issue_date, local_offset)) }
            td class=(TABLE_CELL_STYLE) { (format_optional_date(transaction.return_date, local_offset)) }
            td class=(TABLE_CELL_STYLE) { (format_optional_date(transaction.actual_return_date, local_offset)) }
            td class=(TABLE_CELL_STYLE) { (format_currency(transaction.fine)) }
        }
    }
}
