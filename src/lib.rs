//! intake-vault - encrypted questionnaire record store
//!
//! Submissions are encrypted (AES-256-CBC) and stored one blob per record in
//! a commit-versioned content store. Admins list, approve and delete records
//! with optimistic concurrency on the store's version tokens.

pub mod auth;
pub mod backing_store;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod enrollment;
pub mod geo;
pub mod http_server;
pub mod observability;
pub mod records;
