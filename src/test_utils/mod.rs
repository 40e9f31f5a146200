#![allow(missing_docs)]

use axum::http::StatusCode;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{AppState, DEFAULT_TOKEN_DURATION, build_router, endpoints};

/// The bcrypt cost used in tests, the lowest bcrypt allows.
pub(crate) const TEST_HASH_COST: u32 = 4;

pub(crate) const TEST_PASSWORD: &str = "correct horse battery";

pub(crate) fn get_test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    let mut state = AppState::new(connection, "foobar", DEFAULT_TOKEN_DURATION, "Etc/UTC")
        .expect("Could not create app state");
    state.password_hash_cost = TEST_HASH_COST;

    state
}

pub(crate) fn get_test_server() -> TestServer {
    TestServer::try_new(build_router(get_test_app_state())).expect("Could not create test server.")
}

/// Sign up a user named `username` with the email `<username>@example.com` and
/// [TEST_PASSWORD], returning the created user as JSON.
pub(crate) async fn sign_up(server: &TestServer, username: &str) -> Value {
    let response = server
        .post(endpoints::SIGN_UP)
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": TEST_PASSWORD,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json()
}

/// Log in as `username` with [TEST_PASSWORD] and return the access token.
pub(crate) async fn log_in(server: &TestServer, username: &str) -> String {
    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({
            "username": username,
            "password": TEST_PASSWORD,
        }))
        .await;
    response.assert_status_ok();

    response.json::<Value>()["access_token"]
        .as_str()
        .expect("access_token missing from log-in response")
        .to_owned()
}

/// Sign up and log in as `username`, returning the access token.
pub(crate) async fn sign_up_and_log_in(server: &TestServer, username: &str) -> String {
    sign_up(server, username).await;
    log_in(server, username).await
}

/// Create an expense as the owner of `token` and return it as JSON.
pub(crate) async fn create_test_expense(
    server: &TestServer,
    token: &str,
    amount: &str,
    category: &str,
    date: &str,
) -> Value {
    let response = server
        .post(endpoints::EXPENSES)
        .authorization_bearer(token)
        .json(&json!({
            "amount": amount,
            "category": category,
            "date": date,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json()
}
