//! Defines functions for carrying the session ID in a private cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::SessionID};

pub(crate) const COOKIE_SESSION: &str = "session_id";

/// Add the session cookie to the cookie jar, indicating that a user is logged in.
///
/// The cookie expires at `expires_at`, which should match the session's expiry.
/// The cookie jar encrypts and signs the cookie, so the client can neither
/// read nor forge the session ID.
///
/// Returns the cookie jar with the cookie added.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    session_id: &SessionID,
    expires_at: OffsetDateTime,
) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, session_id.as_str().to_owned()))
            .path("/")
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the session cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Read the session ID from the session cookie.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if the cookie is missing, could not be
/// decrypted, or has been invalidated.
pub(crate) fn get_session_id_from_cookies(jar: &PrivateCookieJar) -> Result<SessionID, Error> {
    match jar.get(COOKIE_SESSION) {
        Some(cookie) if !cookie.value_trimmed().is_empty() && cookie.value() != "deleted" => {
            Ok(SessionID::new_unchecked(cookie.value_trimmed()))
        }
        _ => Err(Error::Unauthorized),
    }
}
