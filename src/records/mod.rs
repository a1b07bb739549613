//! # Record Store
//!
//! Encrypted questionnaire records kept one blob per record.
//!
//! ## Lifecycle
//! - created `pending` by a submission
//! - listed and decrypted transiently for admins
//! - optionally moved to `approved` (never back)
//! - optionally deleted
//!
//! Mutations always carry the version token from the read they were based
//! on; a concurrent writer turns into [`RecordError::Conflict`].

pub mod errors;
pub mod naming;
pub mod record;
pub mod store;

pub use errors::{RecordError, RecordResult};
pub use naming::{blob_name, scope_blob_name, BLOB_EXTENSION};
pub use record::{Namespaces, Payload, Record, RecordKind, RecordStatus};
pub use store::{ApprovedRecord, ListedRecord, RecordRef, RecordStore};
