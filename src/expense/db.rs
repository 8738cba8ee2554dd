//! Database operations for expense records.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    expense::{ExpenseRecord, MonthlyExpense},
    user::UserID,
};

/// Initialize the expense table.
///
/// There is at most one record per user per month of a year.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS user_expenses (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            year INTEGER NOT NULL,
            expense_amount REAL NOT NULL,
            savings_amount REAL,
            total_savings REAL NOT NULL,
            UNIQUE(user_id, month, year),
            FOREIGN KEY(user_id) REFERENCES users(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

/// Insert or update the record for each month in `monthly_expenses`.
///
/// Records are matched on (user, month, year). Every write happens in one
/// transaction, so either all months are saved or none are.
///
/// # Errors
///
/// Returns an [Error::SqlError] if any write fails, in which case the
/// database is left as it was.
pub fn upsert_expenses(
    user_id: UserID,
    year: i32,
    monthly_expenses: &[MonthlyExpense],
    total_savings: f64,
    connection: &mut Connection,
) -> Result<(), Error> {
    let transaction = connection.transaction()?;

    {
        let mut statement = transaction.prepare(
            "INSERT INTO user_expenses
                (user_id, month, year, expense_amount, savings_amount, total_savings)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id, month, year) DO UPDATE SET
                expense_amount = excluded.expense_amount,
                savings_amount = excluded.savings_amount,
                total_savings = excluded.total_savings",
        )?;

        for entry in monthly_expenses {
            statement.execute((
                user_id.as_i64(),
                entry.month,
                year,
                entry.expense_amount,
                entry.savings_amount,
                total_savings,
            ))?;
        }
    }

    transaction.commit()?;

    Ok(())
}

/// Retrieve the records of `user_id` for `year` ordered by month.
pub fn get_expenses_for_year(
    user_id: UserID,
    year: i32,
    connection: &Connection,
) -> Result<Vec<ExpenseRecord>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, month, year, expense_amount, savings_amount, total_savings
            FROM user_expenses
            WHERE user_id = ?1 AND year = ?2
            ORDER BY month ASC",
        )?
        .query_map((user_id.as_i64(), year), map_row)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<ExpenseRecord, rusqlite::Error> {
    Ok(ExpenseRecord {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        month: row.get(2)?,
        year: row.get(3)?,
        expense_amount: row.get(4)?,
        savings_amount: row.get(5)?,
        total_savings: row.get(6)?,
    })
}
