//! Shared handler state.
//!
//! Built once at boot from [`ServiceConfig`]; immutable afterwards.

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::backing_store::{BlobStore, GitHubContentsStore, InMemoryBlobStore};
use crate::config::{ConfigError, ConfigResult, ServiceConfig, StoreBackend};
use crate::enrollment::{AppStoreConnectEnrollment, BetaEnrollment};
use crate::geo::{DisabledLocator, GeoLocator, IpApiLocator};
use crate::records::{Namespaces, RecordStore};

/// State shared by all routes
#[derive(Debug)]
pub struct AppState {
    pub records: RecordStore,
    pub authenticator: Authenticator,
    pub namespaces: Namespaces,
    /// `None` when beta enrollment is not configured
    pub enrollment: Option<Arc<dyn BetaEnrollment>>,
    pub geo: Arc<dyn GeoLocator>,
}

impl AppState {
    /// State with no enrollment and geolocation turned off
    pub fn new(records: RecordStore, authenticator: Authenticator, namespaces: Namespaces) -> Self {
        Self {
            records,
            authenticator,
            namespaces,
            enrollment: None,
            geo: Arc::new(DisabledLocator),
        }
    }

    pub fn with_enrollment(mut self, enrollment: Arc<dyn BetaEnrollment>) -> Self {
        self.enrollment = Some(enrollment);
        self
    }

    pub fn with_geo(mut self, geo: Arc<dyn GeoLocator>) -> Self {
        self.geo = geo;
        self
    }

    /// Construct every service from a validated configuration
    pub fn from_config(config: &ServiceConfig) -> ConfigResult<Self> {
        let blobs: Arc<dyn BlobStore> = match config.store.backend {
            StoreBackend::Github => Arc::new(
                GitHubContentsStore::new(config.store.github()?)
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?,
            ),
            StoreBackend::Memory => {
                tracing::warn!("using in-memory blob store; records will not persist");
                Arc::new(InMemoryBlobStore::new())
            }
        };

        let records = RecordStore::new(blobs, config.passphrase()?, config.store.list_fan_out);

        let authenticator = Authenticator::from_config(config.auth_credentials_raw().as_deref());
        if let Some(err) = authenticator.config_error() {
            tracing::warn!(error = ?err, "admin credentials unavailable; admin routes will fail closed");
        }

        let mut state = Self::new(records, authenticator, config.namespaces.clone());

        if let Some(asc) = &config.enrollment {
            let client = AppStoreConnectEnrollment::new(asc.clone())
                .map_err(|e| ConfigError::Invalid(format!("enrollment: {}", e)))?;
            state = state.with_enrollment(Arc::new(client));
        }

        if config.geolocation.enabled {
            let locator = IpApiLocator::new(&config.geolocation)
                .map_err(|e| ConfigError::Invalid(format!("geolocation: {}", e)))?;
            state = state.with_geo(Arc::new(locator));
        }

        Ok(state)
    }
}
