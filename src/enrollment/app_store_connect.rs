//! # App Store Connect Enrollment
//!
//! Adds approved identities to a TestFlight beta group.
//!
//! Each call signs a fresh ES256 token (20 minute lifetime) with the
//! configured API key.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::errors::{EnrollmentError, EnrollmentResult};
use super::{BetaEnrollment, EnrollmentOutcome};

const AUDIENCE: &str = "appstoreconnect-v1";
const TOKEN_TTL_SECS: i64 = 20 * 60;

/// App Store Connect settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppStoreConnectConfig {
    pub issuer_id: String,
    pub key_id: String,

    /// PKCS#8 PEM of the API key
    pub private_key: SecretString,

    pub beta_group_id: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Names sent with each tester; the service requires both
    #[serde(default = "default_first_name")]
    pub first_name: String,

    #[serde(default = "default_last_name")]
    pub last_name: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.appstoreconnect.apple.com".to_string()
}

fn default_first_name() -> String {
    "Beta".to_string()
}

fn default_last_name() -> String {
    "Tester".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl AppStoreConnectConfig {
    /// Config with default endpoint, tester names and timeout
    pub fn new(
        issuer_id: impl Into<String>,
        key_id: impl Into<String>,
        private_key: impl Into<SecretString>,
        beta_group_id: impl Into<String>,
    ) -> Self {
        Self {
            issuer_id: issuer_id.into(),
            key_id: key_id.into(),
            private_key: private_key.into(),
            beta_group_id: beta_group_id.into(),
            api_base_url: default_api_base_url(),
            first_name: default_first_name(),
            last_name: default_last_name(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Claims of an App Store Connect API token
#[derive(Debug, Serialize, Deserialize)]
struct AscClaims {
    iss: String,
    iat: i64,
    exp: i64,
    aud: String,
}

/// App Store Connect beta enrollment client
pub struct AppStoreConnectEnrollment {
    client: reqwest::Client,
    config: AppStoreConnectConfig,
    key: EncodingKey,
}

impl std::fmt::Debug for AppStoreConnectEnrollment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStoreConnectEnrollment")
            .field("api_base_url", &self.config.api_base_url)
            .field("key_id", &self.config.key_id)
            .field("beta_group_id", &self.config.beta_group_id)
            .finish()
    }
}

impl AppStoreConnectEnrollment {
    /// Create a client; fails if the private key is not an EC PEM
    pub fn new(config: AppStoreConnectConfig) -> EnrollmentResult<Self> {
        let key = EncodingKey::from_ec_pem(config.private_key.expose_secret().as_bytes())
            .map_err(|e| EnrollmentError::InvalidKey(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EnrollmentError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config,
            key,
        })
    }

    fn token(&self) -> EnrollmentResult<String> {
        let iat = Utc::now().timestamp();
        let claims = AscClaims {
            iss: self.config.issuer_id.clone(),
            iat,
            exp: iat + TOKEN_TTL_SECS,
            aud: AUDIENCE.to_string(),
        };

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.config.key_id.clone());

        encode(&header, &claims, &self.key)
            .map_err(|e| EnrollmentError::TokenGeneration(e.to_string()))
    }
}

#[async_trait]
impl BetaEnrollment for AppStoreConnectEnrollment {
    async fn enroll(&self, email: &str) -> EnrollmentResult<EnrollmentOutcome> {
        let body = json!({
            "data": {
                "type": "betaTesters",
                "attributes": {
                    "email": email,
                    "firstName": self.config.first_name,
                    "lastName": self.config.last_name,
                },
                "relationships": {
                    "betaGroups": {
                        "data": [{ "type": "betaGroups", "id": self.config.beta_group_id }]
                    }
                }
            }
        });

        let url = format!(
            "{}/v1/betaTesters",
            self.config.api_base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(EnrollmentOutcome::Enrolled);
        }
        if status == StatusCode::CONFLICT {
            return Ok(EnrollmentOutcome::AlreadyEnrolled);
        }

        Err(EnrollmentError::Rejected {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}
