//! Signing and verifying the JSON Web Tokens handed out at log-in.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, User, UserID};

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to, as a string.
    pub sub: String,
    /// The email of the user the token was issued to.
    pub email: String,
    /// The time the token was issued as a Unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a Unix timestamp.
    pub exp: i64,
}

impl Claims {
    /// Create the claims for a token issued to `user` at `issued_at` that is valid for `duration`.
    pub fn new(user: &User, issued_at: OffsetDateTime, duration: Duration) -> Self {
        Self {
            sub: user.id.to_string(),
            email: user.email.to_string(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + duration).unix_timestamp(),
        }
    }

    /// The ID of the user the token was issued to.
    ///
    /// # Errors
    ///
    /// Returns [Error::Unauthenticated] if the subject is not a user ID.
    pub fn user_id(&self) -> Result<UserID, Error> {
        self.sub
            .parse()
            .map(UserID::new)
            .map_err(|_| Error::Unauthenticated)
    }
}

/// Sign an access token for `user` that expires after `duration`.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user: &User,
    duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    encode_claims(
        &Claims::new(user, OffsetDateTime::now_utc(), duration),
        encoding_key,
    )
}

pub(crate) fn encode_claims(claims: &Claims, encoding_key: &EncodingKey) -> Result<String, Error> {
    encode(&Header::new(Algorithm::HS256), claims, encoding_key).map_err(|error| {
        tracing::error!("Could not sign access token: {error}");
        Error::TokenCreation(error.to_string())
    })
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
///
/// Returns [Error::Unauthenticated] if the token is malformed, has an invalid signature or has
/// expired.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, decoding_key, &validation)
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected access token: {error}");
            Error::Unauthenticated
        })
}
