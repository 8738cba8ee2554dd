//! The expenses and savings chart shown on the account page.
//!
//! [ExpenseChart] holds the chart state explicitly. The server renders it to an
//! ECharts configuration, and the `ExpenseChart` class in `static/expenses.js`
//! takes that configuration over in the browser and updates it in place after
//! the expense form is submitted.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, Color, JsFunction, Tooltip, Trigger},
    series::Line,
};
use maud::{Markup, PreEscaped, html};

use crate::{expense::ExpenseRecord, html::HeadElement, savings::SavingsProjection};

/// The x-axis labels, one per month of the year.
pub const MONTH_LABELS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The HTML element ID of the chart container.
pub const CHART_ID: &str = "expense-chart";

/// A three series line chart of monthly expenses, monthly savings and
/// accumulated savings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseChart {
    labels: Vec<String>,
    expenses: Vec<f64>,
    savings: Vec<f64>,
    accumulated: Vec<f64>,
}

impl ExpenseChart {
    /// Create a chart showing `projection`.
    pub fn create(projection: &SavingsProjection) -> Self {
        let mut chart = Self {
            labels: MONTH_LABELS.iter().map(|label| label.to_string()).collect(),
            expenses: Vec::new(),
            savings: Vec::new(),
            accumulated: Vec::new(),
        };

        chart.update(projection);
        chart
    }

    /// Create a chart from saved expense records.
    ///
    /// Each record is placed by its month. Months without a record, and
    /// records without a savings amount, count as zero for that month.
    pub fn from_records(records: &[ExpenseRecord]) -> Self {
        let mut expenses = vec![0.0; MONTH_LABELS.len()];
        let mut savings = vec![0.0; MONTH_LABELS.len()];

        for record in records {
            let Some(index) = usize::from(record.month).checked_sub(1) else {
                continue;
            };

            if let (Some(expense), Some(saving)) = (expenses.get_mut(index), savings.get_mut(index))
            {
                *expense = record.expense_amount;
                *saving = record.savings_amount.unwrap_or_default();
            }
        }

        Self::create(&SavingsProjection::from_savings(expenses, savings))
    }

    /// Replace the data of all three series with `projection`.
    ///
    /// The month labels stay fixed.
    pub fn update(&mut self, projection: &SavingsProjection) {
        self.expenses = projection.expenses.clone();
        self.savings = projection.savings.clone();
        self.accumulated = projection.accumulated.clone();
    }

    /// The accumulated savings series.
    pub fn accumulated(&self) -> &[f64] {
        &self.accumulated
    }

    /// Build the ECharts configuration for the chart.
    pub fn to_chart(&self) -> Chart {
        Chart::new()
            .title(Title::new().text("Expenses and Savings"))
            .tooltip(currency_tooltip())
            .legend(Legend::new().top("8%"))
            .grid(
                Grid::new()
                    .left("3%")
                    .right("4%")
                    .bottom("3%")
                    .top(90)
                    .contain_label(true),
            )
            .color(vec![
                Color::from("#ef4444"),
                Color::from("#3b82f6"),
                Color::from("#22c55e"),
            ])
            .x_axis(
                Axis::new()
                    .type_(AxisType::Category)
                    .data(self.labels.clone()),
            )
            .y_axis(
                Axis::new()
                    .type_(AxisType::Value)
                    .axis_label(AxisLabel::new().formatter(currency_formatter())),
            )
            .series(
                Line::new()
                    .name("Monthly Expenses")
                    .data(self.expenses.clone()),
            )
            .series(Line::new().name("Monthly Savings").data(self.savings.clone()))
            .series(
                Line::new()
                    .name("Accumulated Savings")
                    .data(self.accumulated.clone()),
            )
    }

    /// The ECharts configuration as a JavaScript object literal.
    pub fn options(&self) -> String {
        self.to_chart().to_string()
    }
}

/// The container the chart is drawn into.
pub fn chart_view() -> Markup {
    html!(
        section class="w-full mx-auto mb-4"
        {
            div id=(CHART_ID) class="min-h-[380px] rounded dark:bg-gray-100" {}
        }
    )
}

/// Creates the chart component once the page has loaded and hands it to the
/// expense form so that submitting the form updates the same chart.
pub fn chart_script(chart: &ExpenseChart, form_id: &str) -> HeadElement {
    let script = format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const chart = new ExpenseChart(document.getElementById("{CHART_ID}"), {options});
            bindExpenseForm(document.getElementById("{form_id}"), chart);
        }});"#,
        options = chart.options(),
    );

    HeadElement::ScriptSource(PreEscaped(script))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Line))
}
