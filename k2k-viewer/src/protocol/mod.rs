//! Tracking server protocol
//!
//! `TrackerClient` is the contract the session controller drives. Every call
//! is a single network round trip: no internal retries, retry policy belongs
//! to the caller.

mod http;
pub mod setup;

pub use http::HttpTrackerClient;

use async_trait::async_trait;
use k2k_common::model::{CalibrationStatus, ClientList, TrackingResult};
use k2k_common::{Error, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Answer to a start/stop request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleResponse {
    pub success: bool,
    /// Free-form server text, shown to the user verbatim
    #[serde(rename = "message", default)]
    pub server_message: String,
}

impl SimpleResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            server_message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            server_message: message.into(),
        }
    }
}

/// Outcome of one tracking poll
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingPoll {
    /// A fused frame is available
    Result(TrackingResult),
    /// Nothing new since the last poll
    NoNewResult,
}

/// Operations offered by the tracking server
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Parse a setup file and confirm the server is reachable
    ///
    /// # Errors
    /// `Unavailable` if the server does not answer; `Config`/`Io` for a bad
    /// setup file.
    async fn load_setup(&self, path: &Path) -> Result<ClientList>;

    /// Open a named session
    async fn start_session(&self, name: &str) -> Result<SimpleResponse>;

    /// Close the current session
    async fn stop_session(&self) -> Result<SimpleResponse>;

    /// Begin acquiring calibration frames
    async fn start_calibration(&self) -> Result<SimpleResponse>;

    /// Single calibration status query
    async fn poll_calibration_status(&self) -> Result<CalibrationStatus>;

    /// Begin tracking (after calibration finished)
    async fn start_tracking(&self) -> Result<SimpleResponse>;

    /// Single tracking result query
    async fn poll_tracking_result(&self) -> Result<TrackingPoll>;
}

/// Tracking server base address
///
/// Immutable once a client is built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parse `http://host:port`; a bare `host:port` is taken as http
    pub fn parse(address: &str) -> Result<Self> {
        let address = address.trim();
        let with_scheme = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        };

        let url = Url::parse(&with_scheme)
            .map_err(|e| Error::Config(format!("Invalid server address '{}': {}", address, e)))?;

        let scheme = url.scheme().to_string();
        if scheme != "http" && scheme != "https" {
            return Err(Error::Config(format!(
                "Unsupported scheme '{}' in server address '{}'",
                scheme, address
            )));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Config(format!("Missing host in server address '{}'", address)))?
            .to_string();

        let port = url.port_or_known_default().ok_or_else(|| {
            Error::Config(format!("Missing port in server address '{}'", address))
        })?;

        Ok(Self { scheme, host, port })
    }

    /// `scheme://host:port` without trailing slash
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Absolute URL for an API path (path starts with `/`)
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_parse_full_url() {
        let endpoint = Endpoint::parse("http://192.168.1.10:8000").unwrap();
        assert_eq!(endpoint.scheme, "http");
        assert_eq!(endpoint.host, "192.168.1.10");
        assert_eq!(endpoint.port, 8000);
        assert_eq!(
            endpoint.url("/api/ping"),
            "http://192.168.1.10:8000/api/ping"
        );
    }

    #[test]
    fn test_endpoint_parse_without_scheme() {
        let endpoint = Endpoint::parse("tracker.local:9000").unwrap();
        assert_eq!(endpoint.base_url(), "http://tracker.local:9000");
    }

    #[test]
    fn test_endpoint_default_port_from_scheme() {
        let endpoint = Endpoint::parse("https://tracker.example.org").unwrap();
        assert_eq!(endpoint.port, 443);
    }

    #[test]
    fn test_endpoint_rejects_other_schemes() {
        assert!(matches!(
            Endpoint::parse("ftp://tracker.local:21"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_simple_response_wire_names() {
        let resp: SimpleResponse =
            serde_json::from_str(r#"{"success": false, "message": "session exists"}"#).unwrap();
        assert_eq!(resp, SimpleResponse::rejected("session exists"));

        let resp: SimpleResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(resp.success);
        assert!(resp.server_message.is_empty());
    }
}
