//! Application router configuration with protected and unprotected route definitions.

use std::path::Path;

use axum::{
    Router,
    handler::HandlerWithoutStateExt,
    middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::get_account_page,
    auth::{
        auth_guard, auth_guard_api, get_log_in_page, get_log_out, get_register_page,
        post_log_in, register_user,
    },
    endpoints,
    expense::{get_expenses_endpoint, save_expenses_endpoint},
    not_found::get_404_not_found,
    user::get_user_endpoint,
};

/// Return a router with all the app's routes.
///
/// Requests that match no route are served from `static_dir`, and anything
/// that is not a file there gets a 404 JSON response.
pub fn build_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(
            endpoints::LOG_IN,
            get(get_log_in_page).post(post_log_in),
        )
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::REGISTER,
            get(get_register_page).post(register_user),
        );

    let protected_pages = Router::new()
        .route(endpoints::ACCOUNT_VIEW, get(get_account_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // API routes answer with 401 instead of redirecting to the log-in page.
    let protected_api = Router::new()
        .route(endpoints::SAVE_EXPENSES, post(save_expenses_endpoint))
        .route(endpoints::EXPENSES, get(get_expenses_endpoint))
        .route(endpoints::USER, get(get_user_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_api));

    let static_files = ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(get_404_not_found.into_service());

    protected_pages
        .merge(protected_api)
        .merge(unprotected_routes)
        .fallback_service(static_files)
        .with_state(state)
}

/// The root path '/' redirects to the account page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::ACCOUNT_VIEW)
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{AppState, auth::COOKIE_SESSION, endpoints, test_utils::new_test_server};

    fn get_test_server() -> (TestServer, AppState) {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "42", "Etc/UTC")
            .unwrap()
            .with_password_hash_cost(4);

        (new_test_server(state.clone()), state)
    }

    #[tokio::test]
    async fn unmatched_route_is_not_found_json() {
        let (server, _) = get_test_server();

        for path in ["/does/not/exist", "/api/unknown", "/nope.css"] {
            let response = server.get(path).await;

            response.assert_status_not_found();
            response.assert_text(r#"{"message":"Not Found"}"#);
        }
    }

    #[tokio::test]
    async fn unmatched_post_is_not_found_json() {
        let (server, _) = get_test_server();

        let response = server.post("/does/not/exist").await;

        response.assert_status_not_found();
        response.assert_text(r#"{"message":"Not Found"}"#);
    }

    #[tokio::test]
    async fn serves_static_files() {
        let (server, _) = get_test_server();

        let response = server.get("/expenses.js").await;

        response.assert_status_ok();
        assert!(response.text().contains("class ExpenseChart"));
    }

    #[tokio::test]
    async fn root_redirects_to_account() {
        let (server, _) = get_test_server();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::ACCOUNT_VIEW);
    }

    #[tokio::test]
    async fn user_route_without_session_is_unauthorized() {
        let (server, _) = get_test_server();

        let response = server.get(endpoints::USER).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "message": "Unauthorized" }));
    }

    #[tokio::test]
    async fn register_log_in_and_save_expenses() {
        let (server, state) = get_test_server();

        server
            .post(endpoints::REGISTER)
            .form(&[
                ("name", "Jane"),
                ("lastName", "Doe"),
                ("email", "jane@example.com"),
                ("username", "jdoe"),
                ("password", "hunter2"),
            ])
            .await
            .assert_status_see_other();

        let cookie = server
            .post(endpoints::LOG_IN)
            .form(&[("username", "jdoe"), ("password", "hunter2")])
            .await
            .cookie(COOKIE_SESSION);

        server
            .get(endpoints::USER)
            .add_cookie(cookie.clone())
            .await
            .assert_json(&json!({ "name": "Jane" }));

        server
            .post(endpoints::SAVE_EXPENSES)
            .add_cookie(cookie)
            .json(&json!({
                "expenses": vec![100.0; 12],
                "savings": vec![900.0; 12],
                "totalSavings": 10_800.0,
            }))
            .await
            .assert_status_ok();

        let count: i64 = state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM user_expenses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 12);
    }
}
