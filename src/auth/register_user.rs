//! The registration page and the route handler for creating new users.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use email_address::EmailAddress;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, FieldError, PasswordHash, ValidatedPassword,
    auth::{cookie::set_session_cookie, extract::JsonOrForm, session::create_session},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, LINK_STYLE, base, log_in_register, text_input},
    user::{NewUser, create_user, username_exists},
};

fn registration_form() -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::REGISTER)
            class="space-y-4 md:space-y-6"
        {
            (text_input("Name", "name", "text", ""))
            (text_input("Last Name", "lastName", "text", ""))
            (text_input("Email", "email", "email", ""))
            (text_input("Username", "username", "text", ""))
            (text_input("Password", "password", "password", ""))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let content = log_in_register("Create an account", &registration_form());
    base("Register", &[], &content).into_response()
}

/// The data submitted with the registration form.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterForm {
    /// Check every field, collecting all of the problems rather than stopping at the first.
    fn validate(&self) -> Result<ValidatedPassword, Error> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }

        if self.last_name.trim().is_empty() {
            errors.push(FieldError::new("lastName", "Last Name is required"));
        }

        if !EmailAddress::is_valid(self.email.trim()) {
            errors.push(FieldError::new("email", "Invalid email address"));
        }

        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        }

        let password = match ValidatedPassword::new(&self.password) {
            Ok(password) => Some(password),
            Err(Error::Validation(password_errors)) => {
                errors.extend(password_errors);
                None
            }
            Err(error) => return Err(error),
        };

        match password {
            Some(password) if errors.is_empty() => Ok(password),
            _ => Err(Error::Validation(errors)),
        }
    }
}

/// Create a new user, start a session and redirect the client to the account page.
///
/// # Errors
///
/// - [Error::Validation] if a field is missing or the email is malformed.
/// - [Error::DuplicateUsername] if the username is already taken.
/// - Hashing and database errors are internal server errors.
pub async fn register_user(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    JsonOrForm(user_data): JsonOrForm<RegisterForm>,
) -> Result<Response, Error> {
    let password = user_data.validate()?;
    let username = user_data.username.trim().to_owned();

    {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        if username_exists(&username, &connection)? {
            return Err(Error::DuplicateUsername);
        }
    }

    let password_hash = PasswordHash::new(password, state.password_hash_cost).inspect_err(|error| {
        tracing::error!("an error occurred while hashing a password: {error}");
    })?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    // The UNIQUE constraint still catches a registration that raced the check above.
    let user = create_user(
        NewUser {
            name: user_data.name.trim().to_owned(),
            last_name: user_data.last_name.trim().to_owned(),
            email: user_data.email.trim().to_owned(),
            username,
            password_hash,
        },
        &connection,
    )?;

    tracing::info!("Registered new user {} with ID {}", user.username, user.id);

    let session = create_session(user.id, state.session_duration, &connection)?;
    let jar = set_session_cookie(jar, &session.id, session.expires_at);

    Ok((jar, Redirect::to(endpoints::ACCOUNT_VIEW)).into_response())
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_valid_html, must_get_form,
            parse_html_document,
        },
    };

    use super::get_register_page;

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;
        assert_eq!(response.status(), StatusCode::OK);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_eq!(form.value().attr("action"), Some(endpoints::REGISTER));
        assert_eq!(form.value().attr("method"), Some("post"));
        assert_form_input(&form, "name", "text");
        assert_form_input(&form, "lastName", "text");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "password", "password");
        assert_form_submit_button(&form);

        let link_selector = scraper::Selector::parse("a[href]").unwrap();
        let links = form.select(&link_selector).collect::<Vec<_>>();
        assert_eq!(links.len(), 1, "want 1 link, got {}", links.len());
        assert_eq!(links[0].value().attr("href"), Some(endpoints::LOG_IN));
    }
}
