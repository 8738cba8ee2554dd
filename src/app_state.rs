//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, PasswordHash, auth::DEFAULT_SESSION_DURATION, db::initialize,
    timezone::get_local_offset,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which sessions are valid after their last use.
    pub session_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Used to decide which year "the current year" is when saving expenses.
    pub local_timezone: String,

    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezoneError] if `local_timezone` is not a
    /// known timezone, or an SQL error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            session_duration: DEFAULT_SESSION_DURATION,
            local_timezone: local_timezone.to_owned(),
            password_hash_cost: PasswordHash::DEFAULT_COST,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Use `cost` for hashing passwords of newly registered users.
    ///
    /// Tests use a low cost so that registering users does not dominate the run time.
    pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.password_hash_cost = cost;
        self
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::{AppState, Error, PasswordHash};

    use super::create_cookie_key;

    #[test]
    fn new_initializes_database() {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "foobar", "Etc/UTC")
            .expect("Could not create app state");

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                AND name IN ('users', 'sessions', 'user_expenses')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 3);
        assert_eq!(state.password_hash_cost, PasswordHash::DEFAULT_COST);
    }

    #[test]
    fn new_rejects_unknown_timezone() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foobar",
            "Middle/Earth",
        );

        assert_eq!(
            state.err(),
            Some(Error::InvalidTimezoneError("Middle/Earth".to_owned()))
        );
    }

    #[test]
    fn same_secret_produces_same_key() {
        assert_eq!(
            create_cookie_key("hunter2").master(),
            create_cookie_key("hunter2").master()
        );
        assert_ne!(
            create_cookie_key("hunter2").master(),
            create_cookie_key("hunter3").master()
        );
    }
}
