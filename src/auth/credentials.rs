//! # Credential Set
//!
//! Identity to password-digest mapping, parsed once at startup from a JSON
//! object such as `{"admin@example.com": "<sha256 hex>"}`.

use std::collections::HashMap;

use super::crypto::is_digest;
use super::errors::{AuthError, AuthResult};

/// Immutable admin credential set
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    digests: HashMap<String, String>,
}

impl CredentialSet {
    /// Parse the JSON credential map.
    ///
    /// Any entry whose value is not a hex SHA-256 digest rejects the whole
    /// set, so a typo can never half-configure admin access.
    pub fn parse(raw: &str) -> AuthResult<Self> {
        let map: HashMap<String, String> = serde_json::from_str(raw)
            .map_err(|e| AuthError::MalformedConfig(e.to_string()))?;

        let mut digests = HashMap::with_capacity(map.len());
        for (identity, digest) in map {
            let identity = identity.trim().to_string();
            if identity.is_empty() {
                return Err(AuthError::MalformedConfig("empty identity".to_string()));
            }
            if !is_digest(&digest) {
                return Err(AuthError::MalformedConfig(format!(
                    "digest for {} is not sha256 hex",
                    identity
                )));
            }
            digests.insert(identity, digest.to_ascii_lowercase());
        }

        Ok(Self { digests })
    }

    pub fn digest_for(&self, identity: &str) -> Option<&str> {
        self.digests.get(identity).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

// Identities only; digests stay out of logs
impl std::fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSet")
            .field("identities", &self.digests.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::crypto::hash_password;

    #[test]
    fn test_parse_valid_set() {
        let raw = format!(
            r#"{{"a@x.com": "{}", "b@x.com": "{}"}}"#,
            hash_password("one"),
            hash_password("two").to_uppercase()
        );
        let set = CredentialSet::parse(&raw).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.digest_for("a@x.com"), Some(hash_password("one").as_str()));
        // Stored lowercase
        assert_eq!(set.digest_for("b@x.com"), Some(hash_password("two").as_str()));
        assert_eq!(set.digest_for("c@x.com"), None);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in [
            "",
            "not json",
            "[]",
            r#"{"a@x.com": 42}"#,
            r#"{"a@x.com": "plaintext-password"}"#,
        ] {
            assert!(
                matches!(CredentialSet::parse(raw), Err(AuthError::MalformedConfig(_))),
                "expected {:?} to be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_debug_hides_digests() {
        let digest = hash_password("secret");
        let set = CredentialSet::parse(&format!(r#"{{"a@x.com": "{}"}}"#, digest)).unwrap();
        let debug = format!("{:?}", set);

        assert!(debug.contains("a@x.com"));
        assert!(!debug.contains(&digest));
    }
}
