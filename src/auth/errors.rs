//! # Auth Errors

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown identity or wrong password (never says which)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Identity or password missing from the request
    #[error("Identity and password are required")]
    MissingCredentials,

    /// No credential set configured
    #[error("Authentication is not configured")]
    NotConfigured,

    /// Credential set present but unusable
    #[error("Authentication configuration is invalid")]
    MalformedConfig(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MissingCredentials => 400,
            AuthError::InvalidCredentials => 401,
            AuthError::NotConfigured => 500,
            AuthError::MalformedConfig(_) => 500,
        }
    }

    /// Machine-checkable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "validation",
            AuthError::InvalidCredentials => "auth",
            AuthError::NotConfigured | AuthError::MalformedConfig(_) => "config",
        }
    }
}
