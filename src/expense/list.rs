//! The route handler for listing the current year's expenses.

use axum::{Extension, Json, extract::State};

use crate::{
    AppState, Error,
    auth::AuthContext,
    expense::{ExpenseRecord, get_expenses_for_year},
    timezone::current_year,
};

/// Get the logged in user's expense records for the current year, ordered by month.
pub async fn get_expenses_endpoint(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<ExpenseRecord>>, Error> {
    let year = current_year(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_expenses_for_year(auth.user.id, year, &connection).map(Json)
}
