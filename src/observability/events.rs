//! Lifecycle events.
//!
//! Every significant state change is logged with a stable `event` field so
//! log pipelines can key on it without parsing messages.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Server listening
    ServerStart,
    /// Server stopped accepting connections
    ServerStop,

    // Records
    /// Encrypted record written
    RecordCreated,
    /// Record left out of a listing (undecryptable or unparsable)
    RecordSkipped,
    /// Record moved to approved
    RecordApproved,
    /// Record deleted
    RecordDeleted,
    /// Mutation rejected because the version token was stale
    RecordConflict,

    // Auth
    /// Admin credential check passed
    AuthAccepted,
    /// Admin credential check failed
    AuthRejected,
    /// Credential set missing or malformed; all checks fail
    AuthUnavailable,

    // Side effects
    /// Beta enrollment succeeded or was already in place
    EnrollmentCompleted,
    /// Beta enrollment failed; local approval stands
    EnrollmentFailed,

    // Requests
    /// Request failed with a server-side error
    RequestFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ServerStart => "SERVER_START",
            Event::ServerStop => "SERVER_STOP",

            Event::RecordCreated => "RECORD_CREATED",
            Event::RecordSkipped => "RECORD_SKIPPED",
            Event::RecordApproved => "RECORD_APPROVED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::RecordConflict => "RECORD_CONFLICT",

            Event::AuthAccepted => "AUTH_ACCEPTED",
            Event::AuthRejected => "AUTH_REJECTED",
            Event::AuthUnavailable => "AUTH_UNAVAILABLE",

            Event::EnrollmentCompleted => "ENROLLMENT_COMPLETED",
            Event::EnrollmentFailed => "ENROLLMENT_FAILED",

            Event::RequestFailed => "REQUEST_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::ServerStart,
            Event::ServerStop,
            Event::RecordCreated,
            Event::RecordSkipped,
            Event::RecordApproved,
            Event::RecordDeleted,
            Event::RecordConflict,
            Event::AuthAccepted,
            Event::AuthRejected,
            Event::AuthUnavailable,
            Event::EnrollmentCompleted,
            Event::EnrollmentFailed,
            Event::RequestFailed,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::RecordApproved), "RECORD_APPROVED");
    }
}
