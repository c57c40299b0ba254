// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Time-series store client.
//!
//! [`StoreClient`] is the seam between the pipeline and the wire: it writes a
//! set of points and answers liveness probes. [`Connector`] builds fresh
//! clients so the connection manager can replace a stale one.
//!
//! The production implementation talks to the InfluxDB 1.x HTTP API:
//!
//! ```text
//! GET  /ping                                   -> 204, X-Influxdb-Version
//! POST /write?db=<db>&rp=<rp>&precision=s      -> 204 (body: Line Protocol)
//! ```

use crate::line_protocol::encode_points;
use crate::metric::{MetricPoint, Precision};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Header carrying the server version on `/ping` responses.
const VERSION_HEADER: &str = "X-Influxdb-Version";

/// Store client errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned status {status}: {message}")]
    Status { status: u16, message: String },
}

/// Result of a liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pong {
    /// Round-trip latency of the probe.
    pub rtt: Duration,
    /// Server version string, empty if the server did not report one.
    pub version: String,
}

/// One batch write against a database and retention policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub database: String,
    pub retention_policy: String,
    pub precision: Precision,
    pub points: Vec<MetricPoint>,
}

/// A connection to the time-series store.
pub trait StoreClient {
    /// Cheap round trip confirming the store is reachable.
    fn ping(&self) -> Result<Pong, StoreError>;

    /// Submit all points of `request` as one write.
    fn write(&self, request: &WriteRequest) -> Result<(), StoreError>;
}

/// Factory for [`StoreClient`]s.
pub trait Connector {
    type Client: StoreClient;

    /// Open a new client. Does not probe it.
    fn connect(&self) -> Result<Self::Client, StoreError>;

    /// Human-readable target, for logs.
    fn target(&self) -> String;
}

/// Static connection parameters for the HTTP store.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    base_url: String,
    username: String,
    password: String,
    timeout: Duration,
}

impl HttpConnector {
    /// Create a connector for `http://<host>:<port>`.
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            base_url: format!("http://{}:{}", host, port),
            username: String::new(),
            password: String::new(),
            timeout,
        }
    }

    /// Use a full base URL instead of host and port.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Authenticate with static credentials. An empty username disables auth.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    /// Base URL of the store.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Connector for HttpConnector {
    type Client = HttpClient;

    fn connect(&self) -> Result<HttpClient, StoreError> {
        reqwest::Url::parse(&self.base_url).map_err(|e| StoreError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        let http = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .build()?;

        Ok(HttpClient {
            http,
            base_url: self.base_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }

    fn target(&self) -> String {
        self.base_url.clone()
    }
}

/// InfluxDB 1.x HTTP client.
pub struct HttpClient {
    http: reqwest::blocking::Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpClient {
    fn authorize(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        if self.username.is_empty() {
            request
        } else {
            request.basic_auth(&self.username, Some(&self.password))
        }
    }
}

impl StoreClient for HttpClient {
    fn ping(&self) -> Result<Pong, StoreError> {
        let started = Instant::now();
        let response = self
            .authorize(self.http.get(format!("{}/ping", self.base_url)))
            .send()?;
        let rtt = started.elapsed();

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(response));
        }

        let version = response
            .headers()
            .get(VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(Pong { rtt, version })
    }

    fn write(&self, request: &WriteRequest) -> Result<(), StoreError> {
        let body = encode_points(&request.points);
        let response = self
            .authorize(self.http.post(format!("{}/write", self.base_url)))
            .query(&[
                ("db", request.database.as_str()),
                ("rp", request.retention_policy.as_str()),
                ("precision", request.precision.as_str()),
            ])
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_error(response))
        }
    }
}

/// Build a status error, preferring the `error` member of a JSON body.
fn status_error(response: reqwest::blocking::Response) -> StoreError {
    let status = response.status().as_u16();
    let text = response.text().unwrap_or_default();
    StoreError::Status {
        status,
        message: error_message(&text),
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
