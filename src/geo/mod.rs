//! # Geolocation
//!
//! Best-effort coarse location for a client address. Lookups never fail a
//! submission: any error degrades to `Unknown`.

pub mod ipapi;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use ipapi::IpApiLocator;

const UNKNOWN: &str = "Unknown";

/// City-level location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub region: String,
    pub country: String,
}

impl Location {
    pub fn unknown() -> Self {
        Self {
            city: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.city, self.region, self.country)
    }
}

/// Geolocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://ipapi.co".to_string()
}

fn default_timeout_secs() -> u64 {
    3
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// IP geolocation capability
#[async_trait]
pub trait GeoLocator: Send + Sync + fmt::Debug {
    /// Locate `ip`, or `None` when nothing is known
    async fn locate(&self, ip: &str) -> Option<Location>;
}

/// Locator used when lookups are turned off
#[derive(Debug, Default)]
pub struct DisabledLocator;

#[async_trait]
impl GeoLocator for DisabledLocator {
    async fn locate(&self, _ip: &str) -> Option<Location> {
        None
    }
}

/// Resolve a display location, falling back to `Unknown` parts
pub async fn describe(locator: &dyn GeoLocator, ip: &str) -> String {
    if ip == "unknown" {
        return Location::unknown().to_string();
    }
    locator
        .locate(ip)
        .await
        .unwrap_or_else(Location::unknown)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_display() {
        assert_eq!(Location::unknown().to_string(), "Unknown, Unknown, Unknown");
    }

    #[tokio::test]
    async fn test_disabled_locator_describes_unknown() {
        assert_eq!(
            describe(&DisabledLocator, "203.0.113.7").await,
            "Unknown, Unknown, Unknown"
        );
    }
}
