// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reusable, health-checked store connection.
//!
//! The manager owns at most one client. A cached client is probed before
//! every reuse because it can go stale between batches without any passive
//! signal. A failed probe triggers exactly one reconnect.
//!
//! ```text
//! Unconnected --connect+ping ok--> Connected --ping ok--> Connected
//!                                      |
//!                                  ping failed
//!                                      v
//!                                  Degraded --connect+ping ok--> Connected
//!                                      |
//!                                   failed --> error to caller
//! ```
//!
//! Not safe for concurrent callers; concurrent writers need one manager each.

use crate::client::{Connector, Pong, StoreClient, StoreError};

/// Lifecycle state of the managed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No client has been established yet.
    Unconnected,
    /// A probed client is cached.
    Connected,
    /// The cached client failed its probe and was discarded.
    Degraded,
}

/// Owner of the single store connection.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    client: Option<C::Client>,
    state: ConnectionState,
    connects: u64,
    reconnects: u64,
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a manager. No connection is opened until [`acquire`](Self::acquire).
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            client: None,
            state: ConnectionState::Unconnected,
            connects: 0,
            reconnects: 0,
        }
    }

    /// Return a client that answered a liveness probe just now.
    ///
    /// A cached client is pinged first and reused on success. If the probe
    /// fails the client is dropped and one fresh connect + probe is made;
    /// its failure is returned as-is, never the stale client.
    pub fn acquire(&mut self) -> Result<&C::Client, StoreError> {
        let client = match self.client.take() {
            Some(cached) => match cached.ping() {
                Ok(pong) => {
                    tracing::debug!(
                        rtt = ?pong.rtt,
                        version = %pong.version,
                        "Using pooled connection"
                    );
                    cached
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ping on pooled connection failed, reconnecting");
                    drop(cached);
                    self.state = ConnectionState::Degraded;
                    self.reconnects += 1;
                    self.open()?
                }
            },
            None => self.open()?,
        };

        self.state = ConnectionState::Connected;
        Ok(self.client.insert(client))
    }

    /// Connect and probe a fresh client.
    fn open(&mut self) -> Result<C::Client, StoreError> {
        let target = self.connector.target();
        tracing::info!(target = %target, "Connecting to store");

        let client = self.connector.connect().map_err(|e| {
            tracing::error!(target = %target, error = %e, "Store connect failed");
            e
        })?;
        let Pong { rtt, version } = client.ping().map_err(|e| {
            tracing::error!(target = %target, error = %e, "Store ping failed");
            e
        })?;

        self.connects += 1;
        tracing::info!(target = %target, rtt = ?rtt, version = %version, "Store connection up");
        Ok(client)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a probed client is cached.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Number of successful connects, including reconnects.
    pub fn connects(&self) -> u64 {
        self.connects
    }

    /// Number of times a cached client failed its probe.
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    /// Get a reference to the connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }
}
