use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

/// The state needed by the lending pages and endpoints.
#[derive(Debug, Clone)]
pub struct LendingState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LendingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) fn get_test_state() -> LendingState {
    LendingState {
        local_timezone: "Etc/UTC".to_owned(),
        db_connection: Arc::new(Mutex::new(crate::test_utils::get_test_connection())),
    }
}
