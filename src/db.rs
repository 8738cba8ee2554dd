//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{auth::create_session_table, expense::create_expense_table, user::create_user_table};

/// Create the tables for the domain models if they do not already exist.
///
/// All tables are created inside one exclusive transaction, so a failure
/// leaves the database untouched.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_session_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()
}
