//! Log-out route handler that ends the session and redirects users.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    AppState, Error,
    auth::{
        cookie::{get_session_id_from_cookies, invalidate_session_cookie},
        session::delete_session,
    },
    endpoints,
};

/// Delete the session, invalidate the session cookie and redirect the client
/// to the log-in page.
///
/// Requests without a session are redirected all the same.
pub async fn get_log_out(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    if let Ok(session_id) = get_session_id_from_cookies(&jar) {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        delete_session(&session_id, &connection)?;
    }

    let jar = invalidate_session_cookie(jar);

    Ok((jar, Redirect::to(endpoints::LOG_IN)).into_response())
}
