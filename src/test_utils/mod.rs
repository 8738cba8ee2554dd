#![allow(missing_docs)]

pub(crate) mod form;
pub(crate) mod html;

use axum_test::TestServer;

use crate::{AppState, build_router};

pub(crate) use form::{
    assert_form_input, assert_form_input_with_value, assert_form_submit_button, must_get_form,
};
pub(crate) use html::{assert_valid_html, must_get_text, parse_html_document};

/// Serve the full app router, with static files from the repository's static directory.
pub(crate) fn new_test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state, "static")).expect("Could not create test server.")
}
