//! Page and endpoint for adding books to the catalog.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    book::{NewBook, create_book, domain::BookFormData},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    user::Role,
};

/// The state needed for adding a book.
#[derive(Debug, Clone)]
pub struct CreateBookState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateBookState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for adding a book.
///
/// Only administrators are routed here.
pub async fn get_new_book_page() -> Response {
    let nav_bar = NavBar::new(endpoints::NEW_BOOK_VIEW, Role::Admin).into_html();
    let form = new_book_form_view("", "", "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-6 text-2xl font-bold" { "Add Book" }
            (form)
        }
    };

    base("Add Book", &content).into_response()
}

/// Add a book to the catalog and send the client to the availability page.
pub async fn create_book_endpoint(
    State(state): State<CreateBookState>,
    Form(form): Form<BookFormData>,
) -> Response {
    let book = match NewBook::new(&form.title, &form.author) {
        Ok(book) => book,
        Err(error) => {
            return new_book_form_view(&form.title, &form.author, &format!("Error: {error}"))
                .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_book(book, &connection) {
        Ok(book) => {
            tracing::info!("Added book \"{}\" with ID {}", book.title, book.id);

            (
                HxRedirect(endpoints::AVAILABILITY_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while adding a book: {error}");

            error.into_alert_response()
        }
    }
}

fn new_book_form_view(title: &str, author: &str, error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::BOOKS_API)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="title" class=(FORM_LABEL_STYLE) { "Title" }

                input
                    id="title"
                    type="text"
                    name="title"
                    placeholder="Title"
                    value=(title)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="author" class=(FORM_LABEL_STYLE) { "Author" }

                input
                    id="author"
                    type="text"
                    name="author"
                    placeholder="Author"
                    value=(author)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Book" }
        }
    }
}
