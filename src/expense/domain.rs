//! Core expense domain types.

use serde::{Deserialize, Serialize};

use crate::{Error, FieldError, savings::SavingsProjection, user::UserID};

/// The expense and savings entered for a single month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyExpense {
    /// The month of the year, from 1 (January) to 12 (December).
    pub month: u8,
    pub expense_amount: f64,
    pub savings_amount: Option<f64>,
}

/// A saved expense for one month of one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: i64,
    pub user_id: UserID,
    /// The month of the year, from 1 (January) to 12 (December).
    pub month: u8,
    pub year: i32,
    pub expense_amount: f64,
    pub savings_amount: Option<f64>,
    /// The savings accumulated over the year as of the last save.
    pub total_savings: f64,
}

/// The body of a request to save the expenses for the current year.
///
/// Entry `i` of `expenses` (and `savings`) is for month `i + 1`. Any user ID
/// the client includes is ignored, the logged in user is always used.
///
/// Clients may send the monthly `income` instead of `savings`, in which case
/// each month's savings is the income minus that month's expense.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveExpensesRequest {
    #[serde(default)]
    pub expenses: Vec<f64>,
    #[serde(default)]
    pub income: Option<f64>,
    #[serde(default)]
    pub savings: Option<Vec<f64>>,
    #[serde(default)]
    pub total_savings: Option<f64>,
}

impl SaveExpensesRequest {
    /// Check the request and pair each entry with its month.
    ///
    /// Returns the monthly expenses and the total savings. When the client
    /// does not send `totalSavings` the savings accumulated over the given
    /// months is used.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if there are no expenses or more than
    /// twelve, an expense is negative, or `savings` is not the same length as
    /// `expenses`.
    pub fn into_monthly_expenses(self) -> Result<(Vec<MonthlyExpense>, f64), Error> {
        let mut errors = Vec::new();

        if self.expenses.is_empty() || self.expenses.len() > 12 {
            errors.push(FieldError::new(
                "expenses",
                "Expenses must have between 1 and 12 entries",
            ));
        }

        if self
            .expenses
            .iter()
            .any(|expense| !expense.is_finite() || *expense < 0.0)
        {
            errors.push(FieldError::new(
                "expenses",
                "Expenses must be non-negative numbers",
            ));
        }

        if let Some(savings) = &self.savings {
            if savings.len() != self.expenses.len() {
                errors.push(FieldError::new(
                    "savings",
                    "Savings must have one entry per expense",
                ));
            } else if savings.iter().any(|amount| !amount.is_finite()) {
                errors.push(FieldError::new("savings", "Savings must be numbers"));
            }
        }

        if self.income.is_some_and(|income| !income.is_finite()) {
            errors.push(FieldError::new("income", "Income must be a number"));
        }

        if self
            .total_savings
            .is_some_and(|total_savings| !total_savings.is_finite())
        {
            errors.push(FieldError::new("totalSavings", "Total savings must be a number"));
        }

        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        let projection = match (self.savings, self.income) {
            (Some(savings), _) => {
                Some(SavingsProjection::from_savings(self.expenses.clone(), savings))
            }
            (None, Some(income)) => Some(SavingsProjection::new(income, &self.expenses)),
            (None, None) => None,
        };

        let total_savings = self
            .total_savings
            .or_else(|| projection.as_ref().map(SavingsProjection::total_savings))
            .unwrap_or_default();

        let monthly_expenses = match projection {
            Some(projection) => projection
                .expenses
                .into_iter()
                .zip(projection.savings)
                .enumerate()
                .map(|(index, (expense_amount, savings_amount))| MonthlyExpense {
                    month: index as u8 + 1,
                    expense_amount,
                    savings_amount: Some(savings_amount),
                })
                .collect(),
            None => self
                .expenses
                .into_iter()
                .enumerate()
                .map(|(index, expense_amount)| MonthlyExpense {
                    month: index as u8 + 1,
                    expense_amount,
                    savings_amount: None,
                })
                .collect(),
        };

        Ok((monthly_expenses, total_savings))
    }
}
