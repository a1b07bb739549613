//! # Admin Authenticator
//!
//! Stateless credential check. Every admin request re-authenticates; there
//! are no sessions, lockouts or rate limits.
//!
//! ## Invariants
//! - Fails closed: a missing or malformed credential set rejects everyone
//! - Unknown identity and wrong password are indistinguishable to callers

use super::credentials::CredentialSet;
use super::crypto::{constant_time_str_eq, hash_password};
use super::errors::{AuthError, AuthResult};

/// Digest compared against for unknown identities, so both failure paths
/// do the same work
const UNKNOWN_IDENTITY_DIGEST: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Admin authenticator
#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials: Result<CredentialSet, AuthError>,
}

impl Authenticator {
    /// Build from the raw credential configuration.
    ///
    /// Never fails: an absent or unparsable configuration yields an
    /// authenticator that rejects every request with a config error.
    pub fn from_config(raw: Option<&str>) -> Self {
        let credentials = match raw.map(str::trim) {
            None | Some("") => Err(AuthError::NotConfigured),
            Some(raw) => CredentialSet::parse(raw),
        };
        Self { credentials }
    }

    pub fn with_credentials(credentials: CredentialSet) -> Self {
        Self {
            credentials: Ok(credentials),
        }
    }

    /// Whether a usable credential set was loaded
    pub fn is_configured(&self) -> bool {
        self.credentials.is_ok()
    }

    /// Configuration problem, if any
    pub fn config_error(&self) -> Option<&AuthError> {
        self.credentials.as_ref().err()
    }

    /// Check a credential pair
    pub fn authenticate(&self, identity: &str, password: &str) -> AuthResult<()> {
        let credentials = self.credentials.as_ref().map_err(Clone::clone)?;

        if identity.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let presented = hash_password(password);
        let expected = credentials.digest_for(identity);
        let matches = constant_time_str_eq(
            &presented,
            expected.unwrap_or(UNKNOWN_IDENTITY_DIGEST),
        );

        if matches && expected.is_some() {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Boolean form of [`Authenticator::authenticate`]
    pub fn verify(&self, identity: &str, password: &str) -> bool {
        self.authenticate(identity, password).is_ok()
    }
}
