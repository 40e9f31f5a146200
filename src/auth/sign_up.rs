//! The route handler for registering a new user.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    Email, Error, PasswordHash, User, Username, ValidatedPassword,
    auth::AuthState,
    extract::Json,
    user::create_user,
};

/// The data needed to sign up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpForm {
    /// The unique display name for the new user.
    pub username: String,
    /// The email address for the new user.
    pub email: String,
    /// The password in plain text.
    pub password: String,
}

/// Handler for sign up requests.
///
/// Responds with `201 Created` and the new user on success.
///
/// # Errors
///
/// This function will return an error if:
/// - any of the fields are invalid,
/// - the email or username is already registered,
/// - the password could not be hashed,
/// - or the user could not be written to the database.
pub async fn sign_up(
    State(state): State<AuthState>,
    Json(form): Json<SignUpForm>,
) -> Result<(StatusCode, Json<User>), Error> {
    let username = Username::new(form.username.trim())?;
    let email = Email::new(&form.email)?;
    let password = ValidatedPassword::new(&form.password)?;

    let password_hash = PasswordHash::new(password, state.password_hash_cost)
        .inspect_err(|error| tracing::error!("Could not hash password: {error}"))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = create_user(username, email, password_hash, &connection)?;
    tracing::info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(user)))
}
