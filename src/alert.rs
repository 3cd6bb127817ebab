//! Error alerts that are swapped into the page's alert container.
//!
//! Forms and buttons target `#alert-container` with `hx-target-error`, so an
//! error response rendered as an alert pops up without replacing the page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

/// An error message shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Something failed, with details on how to fix it.
    Error { message: String, details: String },
    /// Something failed and the message speaks for itself.
    ErrorSimple { message: String },
}

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }

    /// Render the alert and pair it with `status_code`.
    pub fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }

    fn into_markup(self) -> Markup {
        let (message, details) = match self {
            Alert::Error { message, details } => (message, details),
            Alert::ErrorSimple { message } => (message, String::new()),
        };

        // Template adapted from https://flowbite.com/docs/components/alerts/
        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    class="p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50
                        dark:bg-gray-800 dark:text-red-400"
                    role="alert"
                {
                    div class="flex items-start justify-between gap-4"
                    {
                        div
                        {
                            span class="font-medium" { (message) }

                            @if !details.is_empty() {
                                p class="mt-1" { (details) }
                            }
                        }

                        button
                            type="button"
                            aria-label="Close"
                            class="bg-transparent font-bold cursor-pointer"
                            onclick="this.closest('#alert-container').classList.add('hidden')"
                        {
                            "×"
                        }
                    }
                }
            }
        }
    }
}
