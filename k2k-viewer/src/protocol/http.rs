//! HTTP/JSON tracking server client

use super::setup::load_setup_file;
use super::{Endpoint, SimpleResponse, TrackerClient, TrackingPoll};
use async_trait::async_trait;
use k2k_common::model::{CalibrationStatus, ClientList, TrackingResult};
use k2k_common::{Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

const USER_AGENT: &str = concat!("k2k-viewer/", env!("CARGO_PKG_VERSION"));

const PING_PATH: &str = "/api/ping";
const SESSION_START_PATH: &str = "/api/session/start";
const SESSION_STOP_PATH: &str = "/api/session/stop";
const CALIBRATION_START_PATH: &str = "/api/calibration/start";
const CALIBRATION_STATUS_PATH: &str = "/api/calibration/status";
const TRACKING_START_PATH: &str = "/api/tracking/start";
const TRACKING_RESULT_PATH: &str = "/api/tracking/result";

/// Tracking server client over HTTP
///
/// Holds nothing but the endpoint and a pooled `reqwest::Client`.
pub struct HttpTrackerClient {
    http_client: reqwest::Client,
    endpoint: Endpoint,
}

impl HttpTrackerClient {
    pub fn new(endpoint: Endpoint, request_timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Reachability check used before accepting a setup
    async fn ping(&self) -> Result<()> {
        let url = self.endpoint.url(PING_PATH);
        tracing::debug!(url = %url, "Pinging tracking server");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Unavailable(format!("{} did not respond: {}", self.endpoint, e)))?;

        if !response.status().is_success() {
            return Err(Error::Unavailable(format!(
                "{} answered ping with HTTP {}",
                self.endpoint,
                response.status()
            )));
        }
        Ok(())
    }

    /// POST a start/stop style request and decode `{success, message}`
    ///
    /// A `{success, message}` body is honoured whatever the HTTP status, so
    /// server-side rejections keep their message. With `opens_session`, a
    /// server that cannot be reached is reported as `Unavailable`.
    async fn post_simple(
        &self,
        path: &str,
        body: serde_json::Value,
        opens_session: bool,
    ) -> Result<SimpleResponse> {
        let url = self.endpoint.url(path);
        tracing::debug!(url = %url, "POST");

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if opens_session && (e.is_connect() || e.is_timeout()) {
                    Error::Unavailable(format!("{}: {}", self.endpoint, e))
                } else {
                    Error::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        match serde_json::from_str::<SimpleResponse>(&text) {
            Ok(resp) => Ok(resp),
            Err(_) if !status.is_success() => Err(Error::Transport(format!(
                "HTTP {} from {}: {}",
                status, path, text
            ))),
            Err(e) => Err(Error::Parse(format!("{}: {}", path, e))),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint.url(path);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!("HTTP {} from {}: {}", status, path, text)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Parse(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl TrackerClient for HttpTrackerClient {
    async fn load_setup(&self, path: &Path) -> Result<ClientList> {
        let clients = load_setup_file(path).await?;
        self.ping().await?;

        tracing::info!(
            setup = %path.display(),
            clients = clients.len(),
            server = %self.endpoint,
            "Setup loaded"
        );
        Ok(clients)
    }

    async fn start_session(&self, name: &str) -> Result<SimpleResponse> {
        self.post_simple(SESSION_START_PATH, json!({ "name": name }), true)
            .await
    }

    async fn stop_session(&self) -> Result<SimpleResponse> {
        self.post_simple(SESSION_STOP_PATH, json!({}), false).await
    }

    async fn start_calibration(&self) -> Result<SimpleResponse> {
        self.post_simple(CALIBRATION_START_PATH, json!({}), false).await
    }

    async fn poll_calibration_status(&self) -> Result<CalibrationStatus> {
        self.get_json(CALIBRATION_STATUS_PATH).await
    }

    async fn start_tracking(&self) -> Result<SimpleResponse> {
        self.post_simple(TRACKING_START_PATH, json!({}), false).await
    }

    async fn poll_tracking_result(&self) -> Result<TrackingPoll> {
        let url = self.endpoint.url(TRACKING_RESULT_PATH);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(TrackingPoll::NoNewResult);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "HTTP {} from {}: {}",
                status, TRACKING_RESULT_PATH, text
            )));
        }

        let result = response
            .json::<TrackingResult>()
            .await
            .map_err(|e| Error::Parse(format!("{}: {}", TRACKING_RESULT_PATH, e)))?;

        Ok(TrackingPoll::Result(result))
    }
}
