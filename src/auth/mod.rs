//! # Auth Module
//!
//! Admin authentication against a preconfigured credential set.

pub mod authenticator;
pub mod credentials;
pub mod crypto;
pub mod errors;

pub use authenticator::Authenticator;
pub use credentials::CredentialSet;
pub use crypto::hash_password;
pub use errors::{AuthError, AuthResult};
