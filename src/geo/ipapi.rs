//! ipapi.co lookups.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{GeoConfig, GeoLocator, Location, UNKNOWN};

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
    /// Set on rate limiting and reserved addresses
    #[serde(default)]
    error: bool,
}

/// Locator backed by the ipapi.co JSON API
#[derive(Debug)]
pub struct IpApiLocator {
    client: reqwest::Client,
    api_base_url: String,
}

impl IpApiLocator {
    pub fn new(config: &GeoConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn lookup(&self, ip: &str) -> Result<IpApiResponse, reqwest::Error> {
        self.client
            .get(format!("{}/{}/json/", self.api_base_url, ip))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

fn or_unknown(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[async_trait]
impl GeoLocator for IpApiLocator {
    async fn locate(&self, ip: &str) -> Option<Location> {
        // Only literal addresses go into the URL
        if ip.parse::<std::net::IpAddr>().is_err() {
            return None;
        }

        match self.lookup(ip).await {
            Ok(found) if !found.error => Some(Location {
                city: or_unknown(found.city),
                region: or_unknown(found.region),
                country: or_unknown(found.country_name),
            }),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "geolocation lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(url: String) -> IpApiLocator {
        IpApiLocator::new(&GeoConfig {
            enabled: true,
            api_base_url: url,
            timeout_secs: 2,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_locate_parses_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/203.0.113.7/json/")
            .with_status(200)
            .with_body(r#"{"ip":"203.0.113.7","city":"Lisbon","region":"Lisbon","country_name":"Portugal"}"#)
            .create_async()
            .await;

        let location = locator(server.url()).locate("203.0.113.7").await.unwrap();
        assert_eq!(location.to_string(), "Lisbon, Lisbon, Portugal");
    }

    #[tokio::test]
    async fn test_failures_yield_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/203.0.113.7/json/")
            .with_status(429)
            .create_async()
            .await;
        server
            .mock("GET", "/10.0.0.1/json/")
            .with_status(200)
            .with_body(r#"{"ip":"10.0.0.1","error":true,"reason":"Reserved IP Address"}"#)
            .create_async()
            .await;

        let locator = locator(server.url());
        assert!(locator.locate("203.0.113.7").await.is_none());
        assert!(locator.locate("10.0.0.1").await.is_none());
        assert!(locator.locate("../admin").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_fields_become_unknown() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/198.51.100.2/json/")
            .with_status(200)
            .with_body(r#"{"ip":"198.51.100.2","country_name":"Iceland","city":""}"#)
            .create_async()
            .await;

        let location = locator(server.url()).locate("198.51.100.2").await.unwrap();
        assert_eq!(location.to_string(), "Unknown, Unknown, Iceland");
    }
}
