//! Listener and CORS settings for the public API.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderValue;
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Where the API listens and which browser origins may call it
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    /// Interface address; an IP literal
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed to call the API from a browser.
    /// Empty means any origin, which the public submission forms rely on.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl HttpServerConfig {
    /// Resolve the listen address
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        let ip: IpAddr = self
            .host
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|_| format!("http.host is not an IP address: '{}'", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Check the address and every listed origin
    pub fn validate(&self) -> Result<(), String> {
        self.bind_addr()?;
        for origin in &self.cors_origins {
            parse_origin(origin)?;
        }
        Ok(())
    }

    /// CORS policy for the router. Unparsable origins are dropped with a
    /// warning; `validate` rejects them before boot.
    pub fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if self.cors_origins.is_empty() {
            return layer.allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match parse_origin(origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring CORS origin");
                    None
                }
            })
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

fn parse_origin(origin: &str) -> Result<HeaderValue, String> {
    let origin = origin.trim().trim_end_matches('/');
    if !(origin.starts_with("https://") || origin.starts_with("http://")) {
        return Err(format!("CORS origin must be an http(s) URL: '{}'", origin));
    }
    HeaderValue::from_str(origin).map_err(|_| format!("invalid CORS origin: '{}'", origin))
}
