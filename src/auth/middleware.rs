//! Authentication middleware that resolves the session, checks the user still
//! exists, extends the session, and rejects unauthenticated requests.

use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error, User,
    auth::{
        cookie::{get_session_id_from_cookies, invalidate_session_cookie, set_session_cookie},
        session::{Session, extend_session_if_needed, get_session},
    },
    endpoints,
    user::get_user_by_id,
};

/// The authenticated user for the current request.
///
/// The auth guards place this in the request extensions, route handlers
/// receive it with `Extension(auth): Extension<AuthContext>`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    /// The logged in user, as read from the database for this request.
    pub user: User,
}

/// Resolve the session in `jar` to an [AuthContext] and extend the session.
///
/// Rejected requests cause no writes to the database.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if the cookie is missing or invalid, the
/// session does not exist or has expired, or the session's user no longer
/// exists. Other errors are unexpected database errors.
fn authenticate(
    jar: &PrivateCookieJar,
    session_duration: Duration,
    connection: &Connection,
) -> Result<(AuthContext, Session), Error> {
    let session_id = get_session_id_from_cookies(jar)?;

    let session = match get_session(&session_id, connection) {
        Ok(session) => session,
        Err(Error::NotFound) => return Err(Error::Unauthorized),
        Err(error) => return Err(error),
    };

    if session.is_expired(OffsetDateTime::now_utc()) {
        return Err(Error::Unauthorized);
    }

    let user = match get_user_by_id(session.user_id, connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::warn!(
                "Session {} refers to user {} that no longer exists.",
                session.id,
                session.user_id
            );
            return Err(Error::Unauthorized);
        }
        Err(error) => return Err(error),
    };

    let session = extend_session_if_needed(session, session_duration, connection)?;

    Ok((
        AuthContext { user },
        session,
    ))
}

/// Checks for a live session and places the [AuthContext] into the request
/// before executing it, otherwise `on_rejection` produces the response.
///
/// The refreshed session cookie is appended to the response so the cookie
/// expiry follows the session expiry.
#[inline]
async fn auth_guard_internal(
    state: AppState,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
    on_rejection: impl Fn(PrivateCookieJar) -> Response,
) -> Response {
    let authenticated = match state.db_connection.lock() {
        Ok(connection) => authenticate(&jar, state.session_duration, &connection),
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    let (auth_context, session) = match authenticated {
        Ok(authenticated) => authenticated,
        Err(Error::Unauthorized) => return on_rejection(invalidate_session_cookie(jar)),
        Err(error) => return error.into_response(),
    };

    request.extensions_mut().insert(auth_context);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = set_session_cookie(jar, &session.id, session.expires_at);
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Middleware function for pages that checks for a live session.
///
/// The [AuthContext] is placed into the request and the request executed
/// normally if the session is valid, otherwise the client is redirected to
/// the log-in page.
pub async fn auth_guard(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, jar, request, next, |jar| {
        (jar, Redirect::to(endpoints::LOG_IN)).into_response()
    })
    .await
}

/// Middleware function for API routes that checks for a live session.
///
/// The [AuthContext] is placed into the request and the request executed
/// normally if the session is valid, otherwise a 401 Unauthorized JSON
/// response is returned.
pub async fn auth_guard_api(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, jar, request, next, |jar| {
        (jar, Error::Unauthorized).into_response()
    })
    .await
}
