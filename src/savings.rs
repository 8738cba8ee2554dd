//! Monthly savings and the running total of savings over a year.

/// The savings for each month given a fixed monthly income.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsProjection {
    /// The expense for each month, starting from January.
    pub expenses: Vec<f64>,
    /// Income minus expense for each month.
    pub savings: Vec<f64>,
    /// The savings accumulated up to and including each month.
    pub accumulated: Vec<f64>,
}

impl SavingsProjection {
    /// Compute the monthly and accumulated savings for `expenses` against a
    /// constant monthly `income`.
    pub fn new(income: f64, expenses: &[f64]) -> Self {
        let savings = expenses
            .iter()
            .map(|expense| income - expense)
            .collect::<Vec<_>>();

        Self::from_savings(expenses.to_vec(), savings)
    }

    /// Accumulate already computed monthly `savings`.
    pub fn from_savings(expenses: Vec<f64>, savings: Vec<f64>) -> Self {
        let accumulated = savings
            .iter()
            .scan(0.0, |total, amount| {
                *total += amount;
                Some(*total)
            })
            .collect();

        Self {
            expenses,
            savings,
            accumulated,
        }
    }

    /// The savings accumulated by the end of the last month.
    pub fn total_savings(&self) -> f64 {
        self.accumulated.last().copied().unwrap_or_default()
    }
}
