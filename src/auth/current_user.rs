//! An extractor that authenticates requests with a bearer token.

use std::sync::{Arc, Mutex};

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use rusqlite::Connection;
use time::Duration;

use crate::{AppState, Error, TokenKeys, User, auth::token::decode_token, user::get_user_by_id};

/// The state needed to issue and check access tokens.
#[derive(Clone)]
pub struct AuthState {
    /// The keys used to sign and verify access tokens.
    pub token_keys: TokenKeys,
    /// The duration for which access tokens are valid.
    pub token_duration: Duration,
    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            token_duration: state.token_duration,
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The user that sent the request, identified by the bearer token in the `Authorization` header.
///
/// Requests with a missing, malformed, expired or forged token, or a token for a user that no
/// longer exists, are rejected with [Error::Unauthenticated].
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Error::Unauthenticated)?;

        let state = AuthState::from_ref(state);
        let user_id = decode_token(bearer.token(), state.token_keys.decoding_key())?.user_id()?;

        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_id(user_id, &connection) {
            Ok(user) => Ok(CurrentUser(user)),
            Err(Error::NotFound) => {
                tracing::debug!("Rejected access token for unknown user {user_id}");
                Err(Error::Unauthenticated)
            }
            Err(error) => Err(error),
        }
    }
}
