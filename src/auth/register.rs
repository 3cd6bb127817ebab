//! The registration page where readers create their own account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    auth::set_auth_cookie,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        loading_spinner, log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
    user::{Role, Username, create_user},
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

fn username_input(username: &str, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="username" class=(FORM_LABEL_STYLE) { "Username" }

            input
                type="text"
                name="username"
                id="username"
                placeholder="Username"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus
                value=(username);

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }

    }
}

#[derive(Default)]
struct FormErrors<'a> {
    username: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(username: &str, password: &str, errors: FormErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (username_input(username, errors.username))
            (password_input(password, PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", "", FormErrors::default());
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost for hashing new passwords.
    pub hash_cost: u32,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
            hash_cost: PasswordHash::DEFAULT_COST,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Create a plain user account, log the new user in and send them to the book list.
///
/// Invalid input re-renders the form with the problem next to the offending field.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let username = match Username::new(&user_data.username) {
        Ok(username) => username,
        Err(error) => {
            return registration_form(
                &user_data.username,
                &user_data.password,
                FormErrors {
                    username: Some(&error.to_string()),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    let validated_password = match ValidatedPassword::new(&user_data.password, username.as_ref())
    {
        Ok(password) => password,
        Err(error) => {
            return registration_form(
                &user_data.username,
                &user_data.password,
                FormErrors {
                    password: Some(&error.to_string()),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    if user_data.password != user_data.confirm_password {
        return registration_form(
            &user_data.username,
            &user_data.password,
            FormErrors {
                confirm_password: Some("Passwords do not match"),
                ..Default::default()
            },
        )
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, state.hash_cost) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("an error occurred while hashing a password: {e}");

            return get_internal_server_error_redirect();
        }
    };

    let local_timezone = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return get_internal_server_error_redirect();
            }
        };

        create_user(username, password_hash, Role::User, &connection)
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::DuplicateUsername) => {
            return registration_form(
                &user_data.username,
                &user_data.password,
                FormErrors {
                    username: Some("That username is already taken, choose another one."),
                    ..Default::default()
                },
            )
            .into_response();
        }
        Err(e) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {e}");

            return get_internal_server_error_redirect();
        }
    };

    tracing::info!("Registered user {} with ID {}", user.username, user.id);

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_timezone) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::AVAILABILITY_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("An error occurred while setting the auth cookie: {e}");

            get_internal_server_error_redirect()
        }
    }
}


#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode, response::Response};
    use axum_extra::extract::PrivateCookieJar;
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        app_state::create_cookie_key,
        auth::DEFAULT_COOKIE_DURATION,
        db::initialize,
        endpoints,
        test_utils::{assert_hx_redirect, must_get_form, parse_html_fragment},
        user::{Role, Username, create_user, get_user_by_username},
    };

    use super::{RegisterForm, RegistrationState, register_user};

    const PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_state() -> RegistrationState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        RegistrationState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
            hash_cost: 4,
        }
    }

    fn form(username: &str, password: &str, confirm_password: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_owned(),
            password: password.to_owned(),
            confirm_password: confirm_password.to_owned(),
        }
    }

    async fn register(state: &RegistrationState, data: RegisterForm) -> Response {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        register_user(State(state.clone()), jar, Form(data)).await
    }

    async fn assert_form_error(response: Response, want: &str) {
        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let text = must_get_form(&html).text().collect::<String>();
        assert!(text.contains(want), "want error {want:?} in form, got {text:?}");
    }

    #[tokio::test]
    async fn register_creates_plain_user_and_logs_in() {
        let state = get_test_state();

        let response = register(&state, form("reader", PASSWORD, PASSWORD)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::AVAILABILITY_VIEW);
        assert!(response.headers().get("set-cookie").is_some());

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_username("reader", &connection).unwrap();
        assert_eq!(user.role, Role::User);
        assert!(user.password_hash.verify(PASSWORD).unwrap());
    }

    #[tokio::test]
    async fn register_fails_on_empty_username() {
        let state = get_test_state();

        let response = register(&state, form("  ", PASSWORD, PASSWORD)).await;

        assert_form_error(response, "Username cannot be empty").await;
    }

    #[tokio::test]
    async fn register_fails_on_weak_password() {
        let state = get_test_state();

        let response = register(&state, form("reader", "password", "password")).await;

        assert_form_error(response, "password is too weak").await;
    }

    #[tokio::test]
    async fn register_fails_on_mismatched_passwords() {
        let state = get_test_state();

        let response = register(&state, form("reader", PASSWORD, "somethingelseentirely")).await;

        assert_form_error(response, "Passwords do not match").await;
    }

    #[tokio::test]
    async fn register_fails_on_duplicate_username() {
        let state = get_test_state();
        create_user(
            Username::new_unchecked("reader"),
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = register(&state, form("reader", PASSWORD, PASSWORD)).await;

        assert_form_error(response, "already taken").await;
    }
}
