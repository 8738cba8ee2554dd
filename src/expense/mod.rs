//! Monthly expense records and the routes for saving and listing them.

mod db;
mod domain;
mod list;
mod save;

pub use db::{create_expense_table, get_expenses_for_year, upsert_expenses};
pub use domain::{ExpenseRecord, MonthlyExpense, SaveExpensesRequest};
pub use list::get_expenses_endpoint;
pub use save::save_expenses_endpoint;
