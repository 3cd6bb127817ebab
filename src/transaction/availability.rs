//! The book list that every user lands on after logging in.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    auth::Session,
    book::{Book, BookStatus, get_all_books},
    endpoints,
    html::{
        BUTTON_SMALL_STYLE, ISSUED_BADGE_STYLE, STATUS_BADGE_STYLE, TABLE_CELL_STYLE,
        TABLE_ROW_STYLE, base, table_page,
    },
    navigation::NavBar,
    transaction::state::LendingState,
};

/// Render every book in the catalog, with a button to request the available ones.
pub async fn get_availability_page(
    State(state): State<LendingState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let books = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_books(&connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve books: {error}"))?
    };

    let nav_bar = NavBar::new(endpoints::AVAILABILITY_VIEW, session.role).into_html();
    let rows: Vec<Markup> = books.iter().map(book_row).collect();

    let content = html! {
        (nav_bar)
        (table_page(
            "Books",
            &["Title", "Author", "Status", ""],
            &rows,
            "There are no books in the catalog yet.",
        ))
    };

    Ok(base("Books", &content).into_response())
}

fn book_row(book: &Book) -> Markup {
    let badge_style = match book.status {
        BookStatus::Available => STATUS_BADGE_STYLE,
        BookStatus::Issued => ISSUED_BADGE_STYLE,
    };

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (book.title) }
            td class=(TABLE_CELL_STYLE) { (book.author) }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(badge_style) { (book.status) }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @if book.status == BookStatus::Available {
                    form
                        hx-post=(endpoints::REQUEST_ISSUE)
                        hx-target-error="#alert-container"
                    {
                        input type="hidden" name="book_id" value=(book.id);
                        button type="submit" class=(BUTTON_SMALL_STYLE) { "Request" }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod availability_page_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::Selector;

    use crate::{
        auth::Session,
        book::{BookStatus, set_book_status},
        endpoints,
        html::{ISSUED_BADGE_STYLE, STATUS_BADGE_STYLE},
        test_utils::{
            assert_content_type, assert_form_submit_button_with_text, assert_hx_endpoint,
            assert_valid_html, insert_test_book, insert_test_user, parse_html_document,
        },
        transaction::state::get_test_state,
        user::Role,
    };

    use super::get_availability_page;

    #[tokio::test]
    async fn lists_books_by_title_with_request_forms() {
        let state = get_test_state();
        let session = {
            let connection = state.db_connection.lock().unwrap();
            insert_test_book("Solaris", &connection);
            insert_test_book("Beloved", &connection);
            let user = insert_test_user("reader", Role::User, &connection);
            Session {
                user_id: user.id,
                role: user.role,
            }
        };

        let response = get_availability_page(State(state), Extension(session))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let titles: Vec<String> = html
            .select(&Selector::parse("tbody tr td:first-child").unwrap())
            .map(|cell| cell.text().collect::<String>())
            .collect();
        assert_eq!(titles, vec!["Beloved", "Solaris"]);

        let forms: Vec<_> = html.select(&Selector::parse("form").unwrap()).collect();
        assert_eq!(forms.len(), 2);
        for form in &forms {
            assert_hx_endpoint(form, endpoints::REQUEST_ISSUE, "hx-post");
            assert_eq!(form.value().attr("hx-target-error"), Some("#alert-container"));
            assert_form_submit_button_with_text(form, "Request");
        }

        let book_ids: Vec<&str> = html
            .select(&Selector::parse("input[name=book_id]").unwrap())
            .filter_map(|input| input.value().attr("value"))
            .collect();
        assert_eq!(book_ids, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn issued_books_cannot_be_requested() {
        let state = get_test_state();
        let session = {
            let connection = state.db_connection.lock().unwrap();
            let issued = insert_test_book("Beloved", &connection);
            insert_test_book("Solaris", &connection);
            set_book_status(issued.id, BookStatus::Issued, &connection).unwrap();
            let user = insert_test_user("reader", Role::User, &connection);
            Session {
                user_id: user.id,
                role: user.role,
            }
        };

        let response = get_availability_page(State(state), Extension(session))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let row_selector = Selector::parse("tbody tr").unwrap();
        let form_selector = Selector::parse("form").unwrap();
        let forms_per_row: Vec<usize> = html
            .select(&row_selector)
            .map(|row| row.select(&form_selector).count())
            .collect();
        assert_eq!(forms_per_row, vec![0, 1]);

        let badge_selector = Selector::parse("tbody tr span").unwrap();
        let badge_styles: Vec<&str> = html
            .select(&badge_selector)
            .filter_map(|badge| badge.value().attr("class"))
            .collect();
        assert_eq!(badge_styles, vec![ISSUED_BADGE_STYLE, STATUS_BADGE_STYLE]);
    }

    #[tokio::test]
    async fn shows_message_when_catalog_is_empty() {
        let state = get_test_state();
        let session = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user("reader", Role::User, &connection);
            Session {
                user_id: user.id,
                role: user.role,
            }
        };

        let response = get_availability_page(State(state), Extension(session))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("There are no books in the catalog yet."));
    }

    #[tokio::test]
    async fn admins_see_admin_links() {
        let state = get_test_state();
        let session = {
            let connection = state.db_connection.lock().unwrap();
            let admin = insert_test_user("librarian", Role::Admin, &connection);
            Session {
                user_id: admin.id,
                role: admin.role,
            }
        };

        let response = get_availability_page(State(state), Extension(session))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let links: Vec<&str> = html
            .select(&Selector::parse("nav a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert!(links.contains(&endpoints::PENDING_VIEW));
        assert!(links.contains(&endpoints::RETURNS_VIEW));
    }
}
