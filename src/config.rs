//! Service configuration
//!
//! Loaded once at boot from a JSON file, then overlaid with environment
//! variables. Handlers receive the constructed services, never this struct.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::backing_store::GitHubStoreConfig;
use crate::enrollment::AppStoreConnectConfig;
use crate::geo::GeoConfig;
use crate::http_server::HttpServerConfig;
use crate::observability::LogFormat;
use crate::records::Namespaces;

/// Configuration errors. All of them abort boot.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("invalid config JSON: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn status_code(&self) -> u16 {
        500
    }

    pub fn kind(&self) -> &'static str {
        "config"
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which blob store backs the record store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Github,
    /// Process-local store; data is lost on exit
    Memory,
}

/// Backing store settings
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Concurrent reads while listing a namespace
    #[serde(default = "default_list_fan_out")]
    pub list_fan_out: usize,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_list_fan_out() -> usize {
    8
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            api_base_url: default_api_base_url(),
            owner: None,
            repository: None,
            branch: default_branch(),
            token: None,
            timeout_secs: default_timeout_secs(),
            list_fan_out: default_list_fan_out(),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("api_base_url", &self.api_base_url)
            .field("owner", &self.owner)
            .field("repository", &self.repository)
            .field("branch", &self.branch)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("list_fan_out", &self.list_fan_out)
            .finish()
    }
}

impl StoreConfig {
    /// GitHub client settings; requires owner, repository and token
    pub fn github(&self) -> ConfigResult<GitHubStoreConfig> {
        let required = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ConfigError::Invalid(format!("store.{} is required", name)))
        };

        Ok(GitHubStoreConfig {
            api_base_url: self.api_base_url.clone(),
            owner: required(&self.owner, "owner")?,
            repository: required(&self.repository, "repository")?,
            branch: self.branch.clone(),
            token: SecretString::from(required(&self.token, "token")?),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

/// Top-level configuration file structure
#[derive(Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub namespaces: Namespaces,

    /// Passphrase for record encryption
    #[serde(default)]
    pub encryption_key: Option<SecretString>,

    /// identity -> sha256 hex map, as a JSON object or as its JSON text
    #[serde(default)]
    pub auth_credentials: Option<Value>,

    #[serde(default)]
    pub enrollment: Option<AppStoreConnectConfig>,

    #[serde(default)]
    pub geolocation: GeoConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http: HttpServerConfig::default(),
            store: StoreConfig::default(),
            namespaces: Namespaces::default(),
            encryption_key: None,
            auth_credentials: None,
            enrollment: None,
            geolocation: GeoConfig::default(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("http", &self.http)
            .field("store", &self.store)
            .field("namespaces", &self.namespaces)
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "[REDACTED]"))
            .field("auth_credentials", &self.auth_credentials.as_ref().map(|_| "[REDACTED]"))
            .field("enrollment", &self.enrollment.as_ref().map(|e| &e.key_id))
            .field("geolocation", &self.geolocation)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl ServiceConfig {
    /// Load from `path` and the process environment, then validate.
    ///
    /// A missing file yields defaults so the service can run from the
    /// environment alone.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse the file only; no environment, no validation
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Overlay values from an environment lookup
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("GITHUB_PAT_TOKEN") {
            self.store.token = Some(token);
        }
        if let Some(owner) = get("GITHUB_ORG") {
            self.store.owner = Some(owner);
        }
        if let Some(repository) = get("GITHUB_DATA_REPO") {
            self.store.repository = Some(repository);
        }
        if let Some(branch) = get("GITHUB_BRANCH") {
            self.store.branch = branch;
        }
        if let Some(key) = get("ENCRYPTION_KEY") {
            self.encryption_key = Some(SecretString::from(key));
        }
        if let Some(credentials) = get("AUTH_CREDENTIALS") {
            self.auth_credentials = Some(Value::String(credentials));
        }
        if let Some(port) = get("PORT") {
            self.http.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a port number: {}", port)))?;
        }

        let asc_issuer = get("ASC_ISSUER_ID");
        let asc_key_id = get("ASC_KEY_ID");
        let asc_private_key = get("ASC_PRIVATE_KEY").map(|k| k.replace("\\n", "\n"));
        let asc_group = get("ASC_BETA_GROUP_ID");

        if let Some(existing) = self.enrollment.as_mut() {
            if let Some(v) = asc_issuer {
                existing.issuer_id = v;
            }
            if let Some(v) = asc_key_id {
                existing.key_id = v;
            }
            if let Some(v) = asc_private_key {
                existing.private_key = SecretString::from(v);
            }
            if let Some(v) = asc_group {
                existing.beta_group_id = v;
            }
        } else if let (Some(issuer_id), Some(key_id), Some(private_key), Some(group)) =
            (asc_issuer, asc_key_id, asc_private_key, asc_group)
        {
            self.enrollment = Some(AppStoreConnectConfig::new(
                issuer_id,
                key_id,
                private_key,
                group,
            ));
        }
        // Partial ASC settings without a file section leave enrollment off

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let has_key = self
            .encryption_key
            .as_ref()
            .map(|k| !k.expose_secret().is_empty())
            .unwrap_or(false);
        if !has_key {
            return Err(ConfigError::Invalid("encryption_key is required".to_string()));
        }

        self.http.validate().map_err(ConfigError::Invalid)?;
        if self.store.backend == StoreBackend::Github {
            self.store.github()?;
        }
        if self.store.list_fan_out == 0 {
            return Err(ConfigError::Invalid("store.list_fan_out must be > 0".to_string()));
        }
        if self.store.timeout_secs == 0 {
            return Err(ConfigError::Invalid("store.timeout_secs must be > 0".to_string()));
        }
        if self.geolocation.enabled && self.geolocation.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "geolocation.timeout_secs must be > 0".to_string(),
            ));
        }

        for (kind, namespace) in [
            ("survey", &self.namespaces.survey),
            ("waitlist", &self.namespaces.waitlist),
        ] {
            let ns = namespace.trim_matches('/');
            if ns.is_empty() || ns.split('/').any(|part| part.is_empty() || part == "..") {
                return Err(ConfigError::Invalid(format!(
                    "namespaces.{} is not a valid path: '{}'",
                    kind, namespace
                )));
            }
        }
        if self.namespaces.survey == self.namespaces.waitlist {
            return Err(ConfigError::Invalid(
                "survey and waitlist namespaces must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// Passphrase as a secret
    pub fn passphrase(&self) -> ConfigResult<SecretString> {
        self.encryption_key
            .clone()
            .filter(|k| !k.expose_secret().is_empty())
            .ok_or_else(|| ConfigError::Invalid("encryption_key is required".to_string()))
    }

    /// Credential map as JSON text, whichever form it was given in
    pub fn auth_credentials_raw(&self) -> Option<String> {
        match self.auth_credentials.as_ref()? {
            Value::String(raw) => Some(raw.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
