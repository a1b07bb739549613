//! Blob naming.
//!
//! Names are `{namespace}/{identity}_{timestamp}_{suffix}.encrypted`. The
//! timestamp keeps nanoseconds and the suffix adds 24 random bits, so two
//! submissions from one identity in the same clock tick still get distinct
//! names.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::RngCore;

use super::errors::{RecordError, RecordResult};

/// Extension carried by every record blob
pub const BLOB_EXTENSION: &str = ".encrypted";

/// Make an identity safe to embed in a path segment
fn sanitize_identity(identity: &str) -> String {
    let mapped: String = identity
        .replace('@', "_at_")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // ".." must never survive into a path
    mapped.replace("..", "__")
}

/// Build the blob name for a new record
pub fn blob_name(namespace: &str, identity: &str, at: DateTime<Utc>) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Nanos, true)
        .replace([':', '.'], "-");

    let mut suffix = [0u8; 3];
    rand::thread_rng().fill_bytes(&mut suffix);

    format!(
        "{}/{}_{}_{}{}",
        namespace.trim_end_matches('/'),
        sanitize_identity(identity),
        timestamp,
        hex::encode(suffix),
        BLOB_EXTENSION
    )
}

/// Resolve a caller-supplied blob reference inside `namespace`.
///
/// A bare file name is placed under the namespace; a full path must already
/// point directly into it. Anything that could escape the namespace is
/// rejected.
pub fn scope_blob_name(namespace: &str, name: &str) -> RecordResult<String> {
    let namespace = namespace.trim_end_matches('/');
    let name = name.trim();

    if name.is_empty() {
        return Err(RecordError::Validation("blob name is required".to_string()));
    }

    let file = match name.strip_prefix(namespace).and_then(|r| r.strip_prefix('/')) {
        Some(rest) => rest,
        None if !name.contains('/') => name,
        None => {
            return Err(RecordError::Validation(format!(
                "blob {} is outside namespace {}",
                name, namespace
            )))
        }
    };

    if file.contains('/') || file.contains('\\') {
        return Err(RecordError::Validation(format!("invalid blob name: {}", name)));
    }
    if !file.ends_with(BLOB_EXTENSION) {
        return Err(RecordError::Validation(format!(
            "blob name must end with {}",
            BLOB_EXTENSION
        )));
    }

    Ok(format!("{}/{}", namespace, file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_blob_name_shape() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 45).unwrap();
        let name = blob_name("early-access", "a@x.com", at);

        assert!(name.starts_with("early-access/a_at_x.com_2025-06-01T12-30-45-000000000Z_"));
        assert!(name.ends_with(BLOB_EXTENSION));
        assert_eq!(name.matches('/').count(), 1);
    }

    #[test]
    fn test_same_instant_never_collides() {
        let at = Utc::now();
        let names: std::collections::HashSet<_> =
            (0..64).map(|_| blob_name("ns", "a@x.com", at)).collect();
        assert_eq!(names.len(), 64);
    }

    #[test]
    fn test_identity_cannot_escape_namespace() {
        let name = blob_name("ns", "../../etc/passwd", Utc::now());
        assert!(name.starts_with("ns/_____etc_passwd_"));
        assert!(scope_blob_name("ns", &name).is_ok());

        let name = blob_name("ns", "evil/x@y.z", Utc::now());
        assert!(name.starts_with("ns/evil_x_at_y.z_"));
        assert!(scope_blob_name("ns", &name).is_ok());
    }

    #[test]
    fn test_scope_accepts_bare_and_full_names() {
        assert_eq!(
            scope_blob_name("early-access", "a.encrypted").unwrap(),
            "early-access/a.encrypted"
        );
        assert_eq!(
            scope_blob_name("early-access", "early-access/a.encrypted").unwrap(),
            "early-access/a.encrypted"
        );
    }

    #[test]
    fn test_scope_accepts_dotted_legacy_names() {
        let legacy = "early-access/john..doe_at_x.com_2025-01-02T03-04-05-678Z.encrypted";
        assert_eq!(scope_blob_name("early-access", legacy).unwrap(), legacy);
        assert_eq!(
            scope_blob_name("early-access", "john..doe_at_x.com_2025-01-02T03-04-05-678Z.encrypted")
                .unwrap(),
            legacy
        );
    }

    #[test]
    fn test_scope_rejects_escapes() {
        for bad in [
            "",
            "responses/a.encrypted",
            "early-access/sub/a.encrypted",
            "early-access/../a.encrypted",
            "early-access\\..\\a.encrypted",
            "README.md",
        ] {
            assert!(
                scope_blob_name("early-access", bad).is_err(),
                "expected {:?} to be rejected",
                bad
            );
        }
    }
}
