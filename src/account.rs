//! The account page where the logged in user enters their income and monthly
//! expenses and sees the resulting chart.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    AppState, Error,
    auth::AuthContext,
    chart::{ExpenseChart, MONTH_LABELS, chart_script, chart_view},
    endpoints,
    expense::{ExpenseRecord, get_expenses_for_year},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, LINK_STYLE,
        PAGE_CONTAINER_STYLE, base, format_currency,
    },
    timezone::current_year,
};

/// The HTML element ID of the expense form.
const EXPENSE_FORM_ID: &str = "expenseForm";

const ECHARTS_URL: &str = "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// The values to pre-fill the expense form with.
#[derive(Debug, Default, PartialEq)]
struct ExpenseFormValues {
    income: Option<f64>,
    expenses: [Option<f64>; 12],
}

impl ExpenseFormValues {
    /// Recover the form values from saved records.
    ///
    /// Only expense and savings are saved, so the income is recovered from
    /// the first month that has a savings amount.
    fn from_records(records: &[ExpenseRecord]) -> Self {
        let mut values = Self::default();

        for record in records {
            if let Some(expense) = values.expenses.get_mut(usize::from(record.month) - 1) {
                *expense = Some(record.expense_amount);
            }
        }

        values.income = records.iter().find_map(|record| {
            record
                .savings_amount
                .map(|savings_amount| record.expense_amount + savings_amount)
        });

        values
    }
}

fn amount_input(label: &str, name: &str, value: Option<f64>) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type="number"
                name=(name)
                id=(name)
                min="0"
                step="0.01"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                value=[value.map(|amount| amount.to_string())];
        }
    }
}

fn expense_form(values: &ExpenseFormValues) -> Markup {
    html! {
        form id=(EXPENSE_FORM_ID) class="w-full max-w-2xl space-y-4"
        {
            (amount_input("Monthly Income", "income", values.income))

            div class="grid grid-cols-2 md:grid-cols-3 gap-4"
            {
                @for (index, label) in MONTH_LABELS.iter().enumerate() {
                    (amount_input(label, &format!("expense{}", index + 1), values.expenses[index]))
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Save"
            }
        }
    }
}

fn account_view(
    name: &str,
    values: &ExpenseFormValues,
    chart: &ExpenseChart,
    total_savings: f64,
) -> Markup {
    let content = html! {
        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl flex justify-between items-center mb-4"
            {
                h1 class="text-xl font-bold"
                {
                    "Hello, " span id="userName" { (name) }
                }

                a href=(endpoints::LOG_OUT) class=(LINK_STYLE) { "Log out" }
            }

            (expense_form(values))

            p class="my-4"
            {
                "Accumulated savings: "
                span id="totalSavings" { (format_currency(total_savings)) }
            }

            (chart_view())
        }
    };

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_URL.to_owned()),
        HeadElement::ScriptLink("/expenses.js".to_owned()),
        chart_script(chart, EXPENSE_FORM_ID),
    ];

    base("Account", &scripts, &content)
}

/// Display the account page for the logged in user with this year's saved
/// expenses filled in.
pub async fn get_account_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Response, Error> {
    let year = current_year(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let records = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_expenses_for_year(auth.user.id, year, &connection)?
    };

    let values = ExpenseFormValues::from_records(&records);
    let chart = ExpenseChart::from_records(&records);

    Ok(account_view(
        &auth.user.name,
        &values,
        &chart,
        chart.accumulated().last().copied().unwrap_or_default(),
    )
    .into_response())
}
