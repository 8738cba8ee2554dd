//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// The number of bytes of a request or response body that is logged at the
/// `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords in form and JSON bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    let body_text = String::from_utf8_lossy(&body_bytes);

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let display_text = if content_type.starts_with("application/x-www-form-urlencoded") {
        redact_form_password(&body_text)
    } else if content_type.starts_with("application/json") {
        redact_json_password(&body_text)
    } else {
        body_text.to_string()
    };
    log_request(&parts, &display_text);

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

fn redact_form_password(form_text: &str) -> String {
    let Ok(mut pairs) = serde_urlencoded::from_str::<Vec<(String, String)>>(form_text) else {
        return form_text.to_owned();
    };

    for (key, value) in pairs.iter_mut() {
        if key == "password" {
            *value = REDACTED.to_owned();
        }
    }

    serde_urlencoded::to_string(&pairs).unwrap_or_else(|_| form_text.to_owned())
}

fn redact_json_password(json_text: &str) -> String {
    match serde_json::from_str::<Value>(json_text) {
        Ok(Value::Object(mut object)) => {
            if let Some(password) = object.get_mut("password") {
                *password = Value::from(REDACTED);
            }

            Value::Object(object).to_string()
        }
        // Not an object, so there is no password field to hide.
        Ok(value) => value.to_string(),
        Err(_) => json_text.to_owned(),
    }
}

/// The longest prefix of `body` that is at most [LOG_BODY_LENGTH_LIMIT] bytes
/// and ends on a character boundary.
fn truncate(body: &str) -> &str {
    let end = body
        .char_indices()
        .map(|(index, character)| index + character.len_utf8())
        .take_while(|end| *end <= LOG_BODY_LENGTH_LIMIT)
        .last()
        .unwrap_or(0);

    &body[..end]
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}

#[cfg(test)]
mod logging_tests {
    use axum::{Router, middleware, routing::post};
    use axum_test::TestServer;
    use serde_json::json;

    use super::{
        LOG_BODY_LENGTH_LIMIT, logging_middleware, redact_form_password, redact_json_password,
        truncate,
    };

    #[test]
    fn redacts_form_password() {
        assert_eq!(
            redact_form_password("username=jdoe&password=hunter2&remember_me=on"),
            "username=jdoe&password=********&remember_me=on"
        );
    }

    #[test]
    fn form_without_password_is_unchanged() {
        assert_eq!(
            redact_form_password("username=jdoe&old_password=x"),
            "username=jdoe&old_password=x"
        );
    }

    #[test]
    fn redacts_json_password() {
        let redacted = redact_json_password(r#"{"username":"jdoe","password":"hunter2"}"#);

        assert!(!redacted.contains("hunter2"));
        assert!(redacted.contains(r#""password":"********""#));
    }

    #[test]
    fn invalid_json_is_unchanged() {
        assert_eq!(redact_json_password("{not json"), "{not json");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate(&body);

        assert_eq!(truncated.len(), LOG_BODY_LENGTH_LIMIT);
        assert_eq!(truncate("short"), "short");
    }

    #[tokio::test]
    async fn passes_request_and_response_through() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server
            .post("/echo")
            .json(&json!({ "username": "jdoe", "password": "hunter2" }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "username": "jdoe", "password": "hunter2" }));
    }
}
