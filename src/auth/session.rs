//! Server-side sessions stored in the application database.
//!
//! A session links an opaque, randomly generated ID to a user. Only the ID is
//! given to the client (inside a private cookie), everything else stays on
//! the server.

use std::{cmp::max, fmt::Display};

use rusqlite::Connection;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, UserID};

/// The default duration for which a session stays valid after its last use.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::minutes(30);

/// The opaque identifier of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionID(String);

impl SessionID {
    /// Generate a new random session ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a session ID read from a cookie.
    ///
    /// The ID is not checked against the database, use [get_session] for that.
    pub fn new_unchecked(raw_id: &str) -> Self {
        Self(raw_id.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A logged in user's session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionID,
    pub user_id: UserID,
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Whether the session has expired at the time `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

/// Create the sessions table.
///
/// Sessions are deleted along with their user.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_session_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Start a new session for `user_id` that expires after `duration`.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidDateTime] if the expiry overflows,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_session(
    user_id: UserID,
    duration: Duration,
    connection: &Connection,
) -> Result<Session, Error> {
    let expires_at = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::InvalidDateTime(format!("now + {duration} overflows")))?;
    let id = SessionID::generate();

    connection.execute(
        "INSERT INTO sessions (id, user_id, expires_at) VALUES (?1, ?2, ?3)",
        (id.as_str(), user_id.as_i64(), expires_at.unix_timestamp()),
    )?;

    Ok(Session {
        id,
        user_id,
        // Stored with second precision.
        expires_at: to_date_time(expires_at.unix_timestamp())?,
    })
}

/// Get the session with the ID `session_id`.
///
/// Expired sessions are returned as is, callers should check
/// [Session::is_expired].
///
/// # Errors
///
/// Returns a [Error::NotFound] if there is no such session or a
/// [Error::SqlError] if an SQL related error occurred.
pub fn get_session(session_id: &SessionID, connection: &Connection) -> Result<Session, Error> {
    let (user_id, expires_at): (i64, i64) = connection.query_row(
        "SELECT user_id, expires_at FROM sessions WHERE id = ?1",
        (session_id.as_str(),),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(Session {
        id: session_id.clone(),
        user_id: UserID::new(user_id),
        expires_at: to_date_time(expires_at)?,
    })
}

/// Push the expiry of `session` out to at least now plus `duration`.
///
/// Sessions that already expire later than that, e.g. "remember me"
/// sessions, are left unchanged.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if the session no longer exists,
/// - [Error::InvalidDateTime] if the new expiry overflows,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn extend_session_if_needed(
    session: Session,
    duration: Duration,
    connection: &Connection,
) -> Result<Session, Error> {
    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::InvalidDateTime(format!("now + {duration} overflows")))?;
    let new_expiry = to_date_time(new_expiry.unix_timestamp())?;
    let expires_at = max(session.expires_at, new_expiry);

    if expires_at == session.expires_at {
        return Ok(session);
    }

    let rows_affected = connection.execute(
        "UPDATE sessions SET expires_at = ?1 WHERE id = ?2",
        (expires_at.unix_timestamp(), session.id.as_str()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(Session {
        expires_at,
        ..session
    })
}

/// Delete the session `session_id`. Deleting a missing session is not an error.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn delete_session(session_id: &SessionID, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM sessions WHERE id = ?1",
        (session_id.as_str(),),
    )?;

    Ok(())
}

/// Delete every session that has expired, returning how many were deleted.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn delete_expired_sessions(connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            (OffsetDateTime::now_utc().unix_timestamp(),),
        )
        .map_err(Error::from)
}

fn to_date_time(unix_timestamp: i64) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp(unix_timestamp)
        .map_err(|error| Error::InvalidDateTime(error.to_string()))
}

#[cfg(test)]
mod session_tests {
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        auth::session::{
            DEFAULT_SESSION_DURATION, SessionID, create_session, delete_expired_sessions,
            delete_session, extend_session_if_needed, get_session,
        },
        db::initialize,
        user::test_users::insert_test_user,
    };

    fn get_db_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(2),
            "got date time {:?}, want {:?}",
            left,
            right
        );
    }

    #[test]
    fn create_and_get_session() {
        let conn = get_db_connection();
        let user = insert_test_user("alice", &conn);

        let session = create_session(user.id, DEFAULT_SESSION_DURATION, &conn).unwrap();
        let retrieved = get_session(&session.id, &conn).unwrap();

        assert_eq!(retrieved, session);
        assert_date_time_close(
            retrieved.expires_at,
            OffsetDateTime::now_utc() + DEFAULT_SESSION_DURATION,
        );
    }

    #[test]
    fn session_ids_are_unique() {
        let conn = get_db_connection();
        let user = insert_test_user("alice", &conn);

        let first = create_session(user.id, DEFAULT_SESSION_DURATION, &conn).unwrap();
        let second = create_session(user.id, DEFAULT_SESSION_DURATION, &conn).unwrap();

        assert_ne!(first.id, second.id);
    }

    #[test]
    fn get_missing_session_fails() {
        let conn = get_db_connection();

        let result = get_session(&SessionID::new_unchecked("nope"), &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn session_created_in_the_past_is_expired() {
        let conn = get_db_connection();
        let user = insert_test_user("alice", &conn);

        let session = create_session(user.id, Duration::seconds(-10), &conn).unwrap();

        assert!(session.is_expired(OffsetDateTime::now_utc()));
    }

    #[test]
    fn extend_session_pushes_expiry_out() {
        let conn = get_db_connection();
        let user = insert_test_user("alice", &conn);
        let session = create_session(user.id, Duration::seconds(5), &conn).unwrap();

        let extended = extend_session_if_needed(session, Duration::minutes(10), &conn).unwrap();

        assert_date_time_close(
            extended.expires_at,
            OffsetDateTime::now_utc() + Duration::minutes(10),
        );
        assert_eq!(get_session(&extended.id, &conn).unwrap(), extended);
    }

    #[test]
    fn extend_session_does_not_shorten_expiry() {
        let conn = get_db_connection();
        let user = insert_test_user("alice", &conn);
        let session = create_session(user.id, Duration::days(7), &conn).unwrap();

        let extended =
            extend_session_if_needed(session.clone(), Duration::minutes(5), &conn).unwrap();

        assert_eq!(extended, session);
    }

    #[test]
    fn delete_session_removes_it() {
        let conn = get_db_connection();
        let user = insert_test_user("alice", &conn);
        let session = create_session(user.id, DEFAULT_SESSION_DURATION, &conn).unwrap();

        delete_session(&session.id, &conn).unwrap();

        assert_eq!(get_session(&session.id, &conn), Err(Error::NotFound));
        // Deleting twice is fine.
        delete_session(&session.id, &conn).unwrap();
    }

    #[test]
    fn delete_expired_sessions_keeps_live_ones() {
        let conn = get_db_connection();
        let user = insert_test_user("alice", &conn);
        let expired = create_session(user.id, Duration::seconds(-10), &conn).unwrap();
        let live = create_session(user.id, DEFAULT_SESSION_DURATION, &conn).unwrap();

        let deleted = delete_expired_sessions(&conn).unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(get_session(&expired.id, &conn), Err(Error::NotFound));
        assert!(get_session(&live.id, &conn).is_ok());
    }

    #[test]
    fn sessions_are_deleted_with_their_user() {
        let conn = get_db_connection();
        let user = insert_test_user("alice", &conn);
        let session = create_session(user.id, DEFAULT_SESSION_DURATION, &conn).unwrap();

        conn.execute("DELETE FROM users WHERE id = ?1", (user.id.as_i64(),))
            .unwrap();

        assert_eq!(get_session(&session.id, &conn), Err(Error::NotFound));
    }
}
