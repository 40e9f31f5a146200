//! Code for creating the user table, registering users and fetching users from the database.

use std::{fmt::Display, sync::LazyLock};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, PasswordHash, ValidatedPassword};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] if `raw_email` is not a valid email address.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let raw_email = raw_email.trim();

        if EmailAddress::is_valid(raw_email) {
            Ok(Self(raw_email.to_owned()))
        } else {
            Err(Error::Validation {
                field: "email",
                message: format!("{raw_email:?} is not a valid email address"),
            })
        }
    }

    /// Create a new `Email` without any validation.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an incorrectly formatted email is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(raw_email.to_owned())
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A username between [Username::MIN_LENGTH] and [Username::MAX_LENGTH] characters long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// The minimum number of characters in a username.
    pub const MIN_LENGTH: usize = 3;
    /// The maximum number of characters in a username.
    pub const MAX_LENGTH: usize = 50;

    /// Create and validate a username.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] if `raw_username` is too short or too long.
    pub fn new(raw_username: &str) -> Result<Self, Error> {
        let length = raw_username.chars().count();

        if (Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            Ok(Self(raw_username.to_owned()))
        } else {
            Err(Error::Validation {
                field: "username",
                message: format!(
                    "must be between {} and {} characters long",
                    Self::MIN_LENGTH,
                    Self::MAX_LENGTH
                ),
            })
        }
    }

    /// Create a new `Username` without any validation.
    pub fn new_unchecked(raw_username: &str) -> Self {
        Self(raw_username.to_owned())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A user of the application.
///
/// The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's unique display name.
    pub username: Username,
    /// The user's unique email address.
    pub email: Email,
    /// The user's password hash.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    /// When the user signed up.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if the email is already registered,
/// - [Error::DuplicateUsername] if the username is already taken,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    username: Username,
    email: Email,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .prepare(
            "INSERT INTO user (username, email, password, created_at) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, username, email, password, created_at",
        )?
        .query_row(
            (
                username.as_ref(),
                email.as_ref(),
                password_hash.as_ref(),
                OffsetDateTime::now_utc(),
            ),
            map_user_row,
        )
        .map_err(Error::from)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, email, password, created_at FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(Error::from)
}

/// Get the user from the database registered with `email`.
///
/// Emails are compared case-insensitively.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email, or [Error::SqlError] if an SQL related
/// error occurred.
pub fn get_user_by_email(email: &Email, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, email, password, created_at FROM user WHERE email = :email",
        )?
        .query_row(&[(":email", email.as_ref())], map_user_row)
        .map_err(Error::from)
}

/// Get the user from the database with the username `username`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the username, or [Error::SqlError] if an SQL related
/// error occurred.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, email, password, created_at FROM user WHERE username = :username",
        )?
        .query_row(&[(":username", username)], map_user_row)
        .map_err(Error::from)
}

/// The password checked when a login matches no user, so that unknown logins take about as long
/// to reject as wrong passwords.
static DUMMY_PASSWORD_HASH: LazyLock<Option<PasswordHash>> = LazyLock::new(|| {
    PasswordHash::new(
        ValidatedPassword::new_unchecked("not the password of any user"),
        PasswordHash::DEFAULT_COST,
    )
    .inspect_err(|error| tracing::error!("Could not create dummy password hash: {error}"))
    .ok()
});

/// Check a login (email or username) and password against the registered users.
///
/// `login` is looked up as an email address if it parses as one. If no user has that email, or
/// `login` is not an email address, it is looked up as a username.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the user does not exist or the password is wrong, the
/// same error in both cases. Other errors are passed through from the database or bcrypt.
pub fn authenticate(login: &str, raw_password: &str, connection: &Connection) -> Result<User, Error> {
    let user = match find_user_by_login(login, connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            if let Some(dummy_hash) = DUMMY_PASSWORD_HASH.as_ref() {
                let _ = dummy_hash.verify(raw_password);
            }

            return Err(Error::InvalidCredentials);
        }
        Err(error) => return Err(error),
    };

    let is_password_correct = user.password_hash.verify(raw_password).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        Error::HashingError(error.to_string())
    })?;

    if is_password_correct {
        Ok(user)
    } else {
        Err(Error::InvalidCredentials)
    }
}

fn find_user_by_login(login: &str, connection: &Connection) -> Result<User, Error> {
    if let Ok(email) = Email::new(login) {
        match get_user_by_email(&email, connection) {
            Err(Error::NotFound) => {}
            result => return result,
        }
    }

    get_user_by_username(login, connection)
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_username: String = row.get(1)?;
    let raw_email: String = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: Username::new_unchecked(&raw_username),
        email: Email::new_unchecked(&raw_email),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(4)?,
    })
}
