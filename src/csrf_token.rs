//! Anti-replay `state` values for the authorization redirect.
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use tracing::error;

use crate::error::Error;

/// A randomly generated `state` value created using `OsRng` and Base64URL-encoded.
///
/// It is sent to Google with the authorization request and persisted
/// server-side until the callback comes back with it.
/// # Example
/// ```rust, no_run
/// use tiny_search_console::csrf_token::CSRFToken;
///
/// let csrf_token = CSRFToken::new().expect("Failed to generate CSRF token");
/// println!("Generated CSRF Token: {}", csrf_token.value());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CSRFToken(pub(crate) String);

impl CSRFToken {
    /// Generates a new token from 32 bytes of OS randomness.
    /// Returns an `Error::GenToken` if the random generation fails.
    pub fn new() -> Result<Self, Error> {
        let mut key = [0u8; 32];
        OsRng.try_fill_bytes(&mut key).map_err(|e| {
            error!("Failed to generate CSRF token: {:?}", e);
            Error::GenToken
        })?;
        Ok(Self(URL_SAFE_NO_PAD.encode(key)))
    }

    /// Returns the token as a string reference.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<String> for CSRFToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A `state` value received on the callback.
///
/// This token **has not been verified yet** and must be checked against the stored `CSRFToken`.
#[derive(Debug, Clone)]
pub struct UnCheckedCSRFToken(pub(crate) String);

impl UnCheckedCSRFToken {
    /// Compares against the stored token in constant time.
    pub fn verify(&self, stored: &CSRFToken) -> Result<(), Error> {
        let lhs = self.0.as_bytes();
        let rhs = stored.0.as_bytes();
        if lhs.len() != rhs.len() {
            return Err(Error::CSRFNotMatch);
        }
        let diff = lhs.iter().zip(rhs).fold(0u8, |acc, (a, b)| acc | (a ^ b));
        if diff == 0 {
            Ok(())
        } else {
            Err(Error::CSRFNotMatch)
        }
    }
}

impl From<String> for UnCheckedCSRFToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}
