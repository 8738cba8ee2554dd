//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The session module handles the lower level session logic.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, FieldError,
    auth::{
        cookie::set_session_cookie,
        extract::JsonOrForm,
        session::{create_session, delete_expired_sessions},
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, LINK_STYLE, base, log_in_register, text_input},
    user::{User, get_user_by_username},
};

fn log_in_form() -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::LOG_IN)
            class="space-y-4 md:space-y-6"
        {
            (text_input("Username", "username", "text", ""))
            (text_input("Password", "password", "password", ""))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a href=(endpoints::REGISTER) tabindex="0" class=(LINK_STYLE)
                {
                  "Register here"
                }
            }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    let content = log_in_register("Log in to your account", &log_in_form());
    base("Log In", &[], &content).into_response()
}

/// How long the session should last if the user selects "remember me" at log-in.
const REMEMBER_ME_SESSION_DURATION: Duration = Duration::days(7);

/// The raw data entered by the user in the log-in form.
///
/// Missing fields deserialize as empty strings so that they are reported as
/// validation errors rather than rejected by the extractor.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LogInData {
    #[serde(default)]
    pub username: String,

    /// Password entered during log-in.
    #[serde(default)]
    pub password: String,

    /// Whether to extend the initial session duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    #[serde(default)]
    pub remember_me: Option<String>,
}

impl LogInData {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = Vec::new();

        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        }

        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}

/// Check `password` against the stored hash of `user`.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the password does not match, or
/// [Error::HashingError] if the stored hash could not be checked.
fn verify_credentials(user: &User, password: &str) -> Result<(), Error> {
    let is_password_valid = user
        .password_hash
        .verify(password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if is_password_valid {
        Ok(())
    } else {
        Err(Error::InvalidCredentials)
    }
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, a session is started, the session cookie
/// is set and the client is redirected to the account page.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The username or password is missing ([Error::Validation], 400).
/// - The username is unknown or the password is not correct ([Error::InvalidCredentials], 401).
/// - An internal error occurred when verifying the password or starting the session.
pub async fn post_log_in(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    JsonOrForm(user_data): JsonOrForm<LogInData>,
) -> Result<Response, Error> {
    user_data.validate()?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_username(user_data.username.trim(), &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                tracing::info!("Log-in attempt for unknown user {}", user_data.username);
                return Err(Error::InvalidCredentials);
            }
            Err(error) => return Err(error),
        }
    };

    // bcrypt is slow, the database lock must not be held here.
    verify_credentials(&user, &user_data.password)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let session_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_SESSION_DURATION
    } else {
        state.session_duration
    };

    let deleted_count = delete_expired_sessions(&connection)?;
    if deleted_count > 0 {
        tracing::debug!("Deleted {deleted_count} expired sessions.");
    }

    let session = create_session(user.id, session_duration, &connection)?;
    let jar = set_session_cookie(jar, &session.id, session.expires_at);

    Ok((jar, Redirect::to(endpoints::ACCOUNT_VIEW)).into_response())
}

#[cfg(test)]
mod verify_credentials_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize, user::test_users::insert_test_user};

    use super::verify_credentials;

    #[test]
    fn verifies_without_database_access() {
        let user = {
            let connection = Connection::open_in_memory().unwrap();
            initialize(&connection).unwrap();
            insert_test_user("jdoe", &connection)
        };

        // The connection is gone, checking the password only needs the user.
        assert_eq!(verify_credentials(&user, "hunter2"), Ok(()));
        assert_eq!(
            verify_credentials(&user, "wrong"),
            Err(Error::InvalidCredentials)
        );
    }
}
