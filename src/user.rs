//! Code for creating the users table, storing and fetching users, and the
//! route handler that tells the client who is logged in.

use std::fmt::Display;

use axum::{Extension, Json};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash, auth::AuthContext};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's first name.
    pub name: String,
    /// The user's last name.
    pub last_name: String,
    /// The user's email address, validated at registration.
    pub email: String,
    /// The name the user logs in with. Unique across all users.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// The data needed to insert a new user.
///
/// The caller is responsible for validating the fields and hashing the password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: PasswordHash,
}

/// Create the users table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] if the username is already taken,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO users (name, last_name, email, username, password)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &new_user.name,
            &new_user.last_name,
            &new_user.email,
            &new_user.username,
            new_user.password_hash.as_ref(),
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        name: new_user.name,
        last_name: new_user.last_name,
        email: new_user.email,
        username: new_user.username,
        password_hash: new_user.password_hash,
    })
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(5)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        username: row.get(4)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user ([Error::NotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, name, last_name, email, username, password FROM users WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with the username `username`.
///
/// # Errors
///
/// This function will return an error if:
/// - `username` does not belong to a registered user ([Error::NotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, name, last_name, email, username, password
            FROM users WHERE username = :username",
        )?
        .query_row(&[(":username", username)], map_user_row)
        .map_err(|error| error.into())
}

/// Check whether `username` is already taken.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn username_exists(username: &str, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            (username,),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Replace the password hash of the user `user_id`.
///
/// # Errors
///
/// Returns a [Error::NotFound] if no user has the ID `user_id`, or a
/// [Error::SqlError] if some other SQL related error occurred.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE users SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// The publicly visible details of the logged in user.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserNameResponse {
    pub name: String,
}

/// Get the name of the logged in user.
pub async fn get_user_endpoint(
    Extension(auth): Extension<AuthContext>,
) -> Json<UserNameResponse> {
    Json(UserNameResponse {
        name: auth.user.name,
    })
}
