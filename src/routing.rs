//! Application router configuration with public, user and admin route definitions.

use axum::{
    Router,
    http::{HeaderValue, header::CONTENT_SECURITY_POLICY},
    middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer};

use crate::{
    AppState,
    auth::{
        admin_guard, admin_guard_hx, auth_guard, auth_guard_hx, get_log_in_page, get_log_out,
        get_register_page, post_log_in, register_user,
    },
    book::{create_book_endpoint, get_new_book_page},
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{
        approve_issue_endpoint, confirm_return_endpoint, get_availability_page,
        get_my_books_page, get_my_reports_page, get_pending_page, get_return_page,
        get_returns_page, request_issue_endpoint, request_return_endpoint,
    },
};

/// The Content-Security-Policy sent with every response.
///
/// Scripts, styles and fonts may come from this server or the jsDelivr CDN.
const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'self'; \
    style-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net; \
    script-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net; \
    img-src 'self' data:; \
    font-src 'self' https://cdn.jsdelivr.net";

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let user_pages = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::TRANSACTIONS_ROOT, get(get_index_page))
        .route(endpoints::AVAILABILITY_VIEW, get(get_availability_page))
        .route(endpoints::MY_BOOKS_VIEW, get(get_my_books_page))
        .route(endpoints::MY_REPORTS_VIEW, get(get_my_reports_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let user_api = Router::new()
        .route(endpoints::REQUEST_ISSUE, post(request_issue_endpoint))
        .route(endpoints::REQUEST_RETURN, post(request_return_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

    // The admin guard needs the session from the auth guard, so it must be the inner layer.
    let admin_pages = Router::new()
        .route(endpoints::PENDING_VIEW, get(get_pending_page))
        .route(endpoints::RETURNS_VIEW, get(get_returns_page))
        .route(endpoints::RETURN_VIEW, get(get_return_page))
        .route(endpoints::NEW_BOOK_VIEW, get(get_new_book_page))
        .route_layer(middleware::from_fn(admin_guard))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let admin_api = Router::new()
        .route(endpoints::APPROVE_ISSUE, post(approve_issue_endpoint))
        .route(endpoints::CONFIRM_RETURN, post(confirm_return_endpoint))
        .route(endpoints::BOOKS_API, post(create_book_endpoint))
        .route_layer(middleware::from_fn(admin_guard_hx))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

    user_pages
        .merge(user_api)
        .merge(admin_pages)
        .merge(admin_api)
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .layer(SetResponseHeaderLayer::overriding(
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
        ))
        .with_state(state)
}

/// The root paths redirect to the book list.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::AVAILABILITY_VIEW)
}
