//! Login: checking a username and password before a session is issued.
//!
//! Fleetgate defines the [`Authenticator`] trait: a single async method
//! that takes credentials and returns a `UserId` or an error. The
//! in-process [`SharedStore`](crate::SharedStore) implements it against
//! its own [`PasswordHash`]es; a deployment that delegates login to an
//! identity provider implements it there instead.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use fleetgate_protocol::UserId;

use crate::SessionError;

/// Validates a user's credentials and returns their identity.
///
/// # Example
///
/// ```rust
/// use fleetgate_session::{Authenticator, SessionError};
/// use fleetgate_protocol::UserId;
///
/// /// Accepts exactly one hard-coded account. Only for local demos.
/// struct DemoAuthenticator;
///
/// impl Authenticator for DemoAuthenticator {
///     async fn authenticate(
///         &self,
///         username: &str,
///         password: &str,
///     ) -> Result<UserId, SessionError> {
///         if username == "demo" && password == "demo" {
///             Ok(UserId(1))
///         } else {
///             Err(SessionError::AuthFailed("bad credentials".into()))
///         }
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Checks the credentials submitted on the login form.
    ///
    /// # Returns
    /// - `Ok(UserId)`: credentials are valid
    /// - `Err(SessionError::AuthFailed)`: unknown user or wrong password
    fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<UserId, SessionError>> + Send;
}

// ---------------------------------------------------------------------------
// PasswordHash
// ---------------------------------------------------------------------------

/// An Argon2id password hash in PHC string form
/// (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`).
///
/// The PHC string carries its own salt and cost parameters, so hashes
/// written with older settings keep verifying after the defaults change.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    phc: String,
}

impl PasswordHash {
    /// Hashes `password` with a fresh random salt and the default Argon2id
    /// parameters.
    ///
    /// # Errors
    /// Returns [`SessionError::Hashing`] if Argon2 rejects the input.
    pub fn new(password: &str) -> Result<Self, SessionError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(hashing_failed)?
            .to_string();
        Ok(Self { phc })
    }

    /// Returns `true` if `password` produces this hash.
    pub fn verify(&self, password: &str) -> bool {
        match password_hash::PasswordHash::new(&self.phc) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Parses a PHC string, as stored in a seed file or the users table.
    ///
    /// # Errors
    /// Returns [`SessionError::AuthFailed`] if the text is not a well-formed
    /// Argon2 PHC string. The message never echoes the input.
    pub fn parse(encoded: &str) -> Result<Self, SessionError> {
        let malformed = || SessionError::AuthFailed("malformed password hash".into());

        let parsed = password_hash::PasswordHash::new(encoded).map_err(|_| malformed())?;
        if !parsed.algorithm.as_str().starts_with("argon2") || parsed.hash.is_none() {
            return Err(malformed());
        }
        Ok(Self {
            phc: encoded.to_string(),
        })
    }

    /// Renders the PHC string.
    pub fn encode(&self) -> String {
        self.phc.clone()
    }
}

fn hashing_failed(e: password_hash::Error) -> SessionError {
    SessionError::Hashing(e.to_string())
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}
