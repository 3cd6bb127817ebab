//! Authentication middleware that validates cookies, extends sessions, checks roles and handles redirects.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState,
    alert::Alert,
    auth::{
        DEFAULT_COOKIE_DURATION, build_log_in_redirect_url,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::build_log_in_redirect_url_from_target,
    },
    endpoints,
    html::error_view,
    timezone::get_local_offset,
    user::{Role, UserID, get_user_by_id},
};

/// The message shown when a user opens a page reserved for administrators.
pub const ADMIN_ONLY_MESSAGE: &str = "Access Denied: Admin only";

/// The logged in user making the request.
///
/// The auth guards put this into the request extensions, so route handlers
/// can use the function argument `Extension(session): Extension<Session>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Session {
    /// The ID of the logged in user.
    pub user_id: UserID,
    /// What the logged in user is allowed to do.
    pub role: Role,
}

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The connection used to look up the user behind a session.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

fn load_session(user_id: UserID, db_connection: &Mutex<Connection>) -> Option<Session> {
    let connection = match db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return None;
        }
    };

    match get_user_by_id(user_id, &connection) {
        Ok(user) => Some(Session {
            user_id: user.id,
            role: user.role,
        }),
        Err(error) => {
            tracing::warn!("Could not load user {user_id} for session: {error}");
            None
        }
    }
}

/// Checks for a valid auth cookie that belongs to an existing user.
/// A [Session] is placed into the request and then the request executed normally if the cookie
/// is valid, otherwise the redirect to the log-in page from `get_redirect` is returned.
#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    let log_in_redirect_url = build_log_in_redirect_url(&request).unwrap_or_else(|| {
        if request.uri().path().starts_with("/api") {
            tracing::warn!(
                "Missing or invalid HTMX headers for /api request. Falling back to the book list."
            );
        } else {
            tracing::warn!("Invalid redirect URL from request URI. Falling back to the book list.");
        }

        build_log_in_redirect_url_from_target(endpoints::AVAILABILITY_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    });
    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => {
            tracing::error!("Error getting local timezone. Redirecting to log in page.");
            return get_redirect(&log_in_redirect_url);
        }
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return get_redirect(&log_in_redirect_url);
        }
    };
    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(_) => return get_redirect(&log_in_redirect_url),
    };
    let session = match load_session(user_id, &state.db_connection) {
        Some(session) => session,
        None => return get_redirect(&log_in_redirect_url),
    };

    parts.extensions.insert(session);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(
        jar.clone(),
        DEFAULT_COOKIE_DURATION,
        local_offset,
    ) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Middleware function that checks for a valid authorization cookie.
/// The [Session] is placed into request and then the request executed normally if the cookie is valid, otherwise a redirect to the log-in page is returned.
///
/// **Note**: The app state must contain an `axum_extra::extract::cookie::Key` for decrypting and verifying the cookie contents.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(redirect_url).into_response()
    })
    .await
}

/// Middleware function that checks for a valid authorization cookie.
/// The [Session] is placed into request and then the request executed normally if the cookie is valid, otherwise a HTMX redirect to the log-in page is returned.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}

fn is_admin(session: Option<&Session>) -> bool {
    match session {
        Some(session) => session.role == Role::Admin,
        None => {
            tracing::error!(
                "Admin guard ran without a session, check the auth guard is layered outside it."
            );
            false
        }
    }
}

/// Middleware function that only lets administrators through, answering everyone else with a 403 page.
///
/// Must be layered inside [auth_guard] so that the [Session] is available.
pub async fn admin_guard(request: Request, next: Next) -> Response {
    if !is_admin(request.extensions().get::<Session>()) {
        return (
            StatusCode::FORBIDDEN,
            error_view(
                "Access Denied",
                "403",
                ADMIN_ONLY_MESSAGE,
                "Ask a librarian if you need access to this page.",
            ),
        )
            .into_response();
    }

    next.run(request).await
}

/// Middleware function that only lets administrators through, answering everyone else with a 403 alert.
///
/// Must be layered inside [auth_guard_hx] so that the [Session] is available.
pub async fn admin_guard_hx(request: Request, next: Next) -> Response {
    if !is_admin(request.extensions().get::<Session>()) {
        return Alert::ErrorSimple {
            message: ADMIN_ONLY_MESSAGE.to_owned(),
        }
        .into_response_with_status(StatusCode::FORBIDDEN);
    }

    next.run(request).await
}
