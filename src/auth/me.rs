//! The route handler for the user that owns the access token.

use crate::{User, auth::CurrentUser, extract::Json};

/// Respond with the user the bearer token was issued to.
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;
    use time::{Duration, OffsetDateTime};

    use crate::{
        UserID, build_router,
        auth::token::{Claims, encode_claims},
        endpoints,
        test_utils::{get_test_app_state, get_test_server, sign_up, sign_up_and_log_in},
    };

    #[tokio::test]
    async fn get_me_returns_token_owner() {
        let server = get_test_server();
        let token = sign_up_and_log_in(&server, "alice").await;

        let response = server.get(endpoints::ME).authorization_bearer(token).await;

        response.assert_status_ok();
        let user = response.json::<Value>();
        assert_eq!(user["username"], "alice");
        assert_eq!(user["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn get_me_fails_without_token() {
        let server = get_test_server();

        let response = server.get(endpoints::ME).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.header("www-authenticate"), "Bearer");
    }

    #[tokio::test]
    async fn get_me_fails_with_garbage_token() {
        let server = get_test_server();

        server
            .get(endpoints::ME)
            .authorization_bearer("definitely.not.valid")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_me_fails_with_expired_token() {
        let state = get_test_app_state();
        let server = TestServer::try_new(build_router(state.clone()))
            .expect("Could not create test server.");
        let user = sign_up(&server, "alice").await;
        let user_id = UserID::new(user["id"].as_i64().unwrap());
        let issued_at = OffsetDateTime::now_utc() - Duration::hours(2);
        let claims = Claims {
            sub: user_id.to_string(),
            email: "alice@example.com".to_owned(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + Duration::minutes(30)).unix_timestamp(),
        };
        let token = encode_claims(&claims, state.token_keys.encoding_key()).unwrap();

        server
            .get(endpoints::ME)
            .authorization_bearer(token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_me_fails_for_deleted_user() {
        let state = get_test_app_state();
        let server = TestServer::try_new(build_router(state.clone()))
            .expect("Could not create test server.");
        let token = sign_up_and_log_in(&server, "alice").await;
        state
            .db_connection
            .lock()
            .unwrap()
            .execute("DELETE FROM user WHERE username = 'alice'", ())
            .unwrap();

        server
            .get(endpoints::ME)
            .authorization_bearer(token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
