//! The route handler for saving a year of monthly expenses.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::AuthContext,
    expense::{SaveExpensesRequest, upsert_expenses},
    timezone::current_year,
};

/// Save the expenses in the request body as the logged in user's expenses
/// for the current year.
///
/// Months that were already saved this year are overwritten.
///
/// # Errors
///
/// - [Error::Validation] if the body is not JSON of the right shape, or is
///   malformed, see [SaveExpensesRequest::into_monthly_expenses].
/// - [Error::InvalidTimezoneError] if the configured timezone is not valid.
/// - Any database error, in which case none of the months are saved.
pub async fn save_expenses_endpoint(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    request: Result<Json<SaveExpensesRequest>, JsonRejection>,
) -> Result<Json<Value>, Error> {
    let Json(request) = request?;
    let (monthly_expenses, total_savings) = request.into_monthly_expenses()?;

    let year = current_year(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let mut connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    upsert_expenses(
        auth.user.id,
        year,
        &monthly_expenses,
        total_savings,
        &mut connection,
    )
    .inspect_err(|error| {
        tracing::error!(
            "Could not save expenses for user {} in {year}: {error}",
            auth.user.id
        );
    })?;

    tracing::debug!(
        "Saved {} months of expenses for user {} in {year}",
        monthly_expenses.len(),
        auth.user.id
    );

    Ok(Json(json!({ "message": "Expenses saved" })))
}

#[cfg(test)]
mod save_expenses_endpoint_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState, BODY_FIELD,
        auth::COOKIE_SESSION,
        endpoints,
        test_utils::new_test_server,
        timezone::current_year,
        user::{UserID, test_users::insert_test_user},
    };

    fn get_test_server() -> (TestServer, AppState, UserID) {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "42", "Etc/UTC")
            .unwrap()
            .with_password_hash_cost(4);
        let user_id = insert_test_user("jdoe", &state.db_connection.lock().unwrap()).id;

        (new_test_server(state.clone()), state, user_id)
    }

    async fn log_in(server: &TestServer) -> Cookie<'static> {
        let response = server
            .post(endpoints::LOG_IN)
            .form(&[("username", "jdoe"), ("password", "hunter2")])
            .await;
        response.assert_status_see_other();

        response.cookie(COOKIE_SESSION)
    }

    fn count_expense_rows(state: &AppState) -> i64 {
        state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM user_expenses", [], |row| row.get(0))
            .unwrap()
    }

    #[tokio::test]
    async fn saving_twice_keeps_one_row_per_month() {
        let (server, state, user_id) = get_test_server();
        let cookie = log_in(&server).await;

        for expense in [100.0, 200.0] {
            let response = server
                .post(endpoints::SAVE_EXPENSES)
                .add_cookie(cookie.clone())
                .json(&json!({
                    "expenses": vec![expense; 12],
                    "savings": vec![1000.0 - expense; 12],
                    "totalSavings": (1000.0 - expense) * 12.0,
                }))
                .await;

            response.assert_status_ok();
            response.assert_json(&json!({ "message": "Expenses saved" }));
        }

        let year = current_year("Etc/UTC").unwrap();
        let connection = state.db_connection.lock().unwrap();
        let (count, total_expense): (i64, f64) = connection
            .query_row(
                "SELECT COUNT(*), SUM(expense_amount) FROM user_expenses
                WHERE user_id = ?1 AND year = ?2",
                (user_id.as_i64(), year),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 12);
        assert_eq!(total_expense, 2400.0);
    }

    #[tokio::test]
    async fn client_supplied_user_id_is_ignored() {
        let (server, state, user_id) = get_test_server();
        let other_user_id = insert_test_user("other", &state.db_connection.lock().unwrap()).id;
        let cookie = log_in(&server).await;

        let response = server
            .post(endpoints::SAVE_EXPENSES)
            .add_cookie(cookie)
            .json(&json!({
                "userId": other_user_id.as_i64(),
                "expenses": [100.0],
                "totalSavings": 900.0,
            }))
            .await;

        response.assert_status_ok();
        let saved_user_id: i64 = state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT user_id FROM user_expenses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(saved_user_id, user_id.as_i64());
    }

    #[tokio::test]
    async fn invalid_body_is_bad_request() {
        let (server, state, _) = get_test_server();
        let cookie = log_in(&server).await;

        let response = server
            .post(endpoints::SAVE_EXPENSES)
            .add_cookie(cookie)
            .json(&json!({ "expenses": [], "totalSavings": 0.0 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(count_expense_rows(&state), 0);
    }

    #[tokio::test]
    async fn wrongly_typed_body_is_bad_request_json() {
        let (server, state, _) = get_test_server();
        let cookie = log_in(&server).await;

        for body in [
            json!({ "expenses": [100.0, null] }),
            json!({ "expenses": "abc" }),
            json!({ "expenses": [100.0], "totalSavings": "lots" }),
        ] {
            let response = server
                .post(endpoints::SAVE_EXPENSES)
                .add_cookie(cookie.clone())
                .json(&body)
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let response_body = response.json::<serde_json::Value>();
            assert_eq!(
                response_body["errors"][0]["field"], BODY_FIELD,
                "unexpected response for {body}"
            );
        }

        assert_eq!(count_expense_rows(&state), 0);
    }

    #[tokio::test]
    async fn non_json_body_is_bad_request() {
        let (server, state, _) = get_test_server();
        let cookie = log_in(&server).await;

        let response = server
            .post(endpoints::SAVE_EXPENSES)
            .add_cookie(cookie)
            .text("expenses=100")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(count_expense_rows(&state), 0);
    }

    #[tokio::test]
    async fn no_session_is_unauthorized_without_writes() {
        let (server, state, _) = get_test_server();

        let response = server
            .post(endpoints::SAVE_EXPENSES)
            .json(&json!({ "expenses": vec![100.0; 12], "totalSavings": 10_800.0 }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "message": "Unauthorized" }));
        assert_eq!(count_expense_rows(&state), 0);

        let session_count: i64 = state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(session_count, 0);
    }
}
