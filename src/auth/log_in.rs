//! The route handler for exchanging a login and password for an access token.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{AuthState, token::encode_token},
    extract::Json,
    user::authenticate,
};

/// The credentials entered at log-in.
///
/// The user is identified by one of `login`, `username` or `email`. If more than one is given,
/// the first of them in that order is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogInForm {
    /// The email address or username of the user.
    #[serde(default)]
    pub login: Option<String>,
    /// The username of the user.
    #[serde(default)]
    pub username: Option<String>,
    /// The email address of the user.
    #[serde(default)]
    pub email: Option<String>,
    /// The password in plain text.
    pub password: String,
}

impl LogInForm {
    /// The trimmed identifier to look the user up by.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if none of `login`, `username` or `email` is set.
    pub fn identifier(&self) -> Result<&str, Error> {
        [&self.login, &self.username, &self.email]
            .into_iter()
            .flatten()
            .map(|identifier| identifier.trim())
            .find(|identifier| !identifier.is_empty())
            .ok_or_else(|| Error::Validation {
                field: "username",
                message: "a username or email is required".to_owned(),
            })
    }
}

/// A signed access token to be sent as a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The JSON Web Token.
    pub access_token: String,
    /// Always "bearer".
    pub token_type: String,
}

/// Handler for log-in requests.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The login does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password or signing the token.
pub async fn log_in(
    State(state): State<AuthState>,
    Json(form): Json<LogInForm>,
) -> Result<Json<AccessToken>, Error> {
    let identifier = form.identifier()?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        authenticate(identifier, &form.password, &connection)?
    };

    let access_token = encode_token(
        &user,
        state.token_duration,
        state.token_keys.encoding_key(),
    )?;
    tracing::info!("User {} logged in", user.id);

    Ok(Json(AccessToken {
        access_token,
        token_type: "bearer".to_owned(),
    }))
}
