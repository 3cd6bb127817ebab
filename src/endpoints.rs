//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/users/:user_id', use [format_endpoint].

/// The root route which redirects to the book catalog or log in page.
pub const ROOT: &str = "/";
/// The base route for transactions which redirects to the book catalog.
pub const TRANSACTIONS_ROOT: &str = "/transactions";
/// The page listing every book and whether it is available.
pub const AVAILABILITY_VIEW: &str = "/transactions/availability";
/// The page listing the current user's transactions.
pub const MY_BOOKS_VIEW: &str = "/transactions/my-books";
/// The page listing the current user's transactions, newest first.
pub const MY_REPORTS_VIEW: &str = "/transactions/my-reports";
/// The admin page listing issue requests awaiting approval.
pub const PENDING_VIEW: &str = "/transactions/admin/pending";
/// The admin page listing books that users want to return.
pub const RETURNS_VIEW: &str = "/transactions/admin/returns";
/// The admin page for calculating the fine and confirming a return.
pub const RETURN_VIEW: &str = "/transactions/admin/return/{transaction_id}";
/// The admin page for adding a book to the catalog.
pub const NEW_BOOK_VIEW: &str = "/admin/books/new";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to add books to the catalog.
pub const BOOKS_API: &str = "/api/books";
/// The route for requesting a book be issued.
pub const REQUEST_ISSUE: &str = "/api/transactions/request-issue";
/// The route for requesting to return an issued book.
pub const REQUEST_RETURN: &str = "/api/transactions/request-return";
/// The route for approving an issue request.
pub const APPROVE_ISSUE: &str = "/api/transactions/admin/approve";
/// The route for confirming a book has been returned.
pub const CONFIRM_RETURN: &str = "/api/transactions/admin/confirm-return";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
