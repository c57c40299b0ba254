// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batch writer.
//!
//! Reshapes a batch of counter records into points and submits them as a
//! single write through the [`ConnectionManager`]. A batch that still fails
//! after the configured retries is logged and dropped; there is no
//! persistent queue, so a store outage loses the affected chunks.

use crate::client::{Connector, StoreClient, StoreError, WriteRequest};
use crate::connection::ConnectionManager;
use crate::metric::{reshape_batch, Precision};
use crate::record::CounterRecord;
use std::time::Duration;
use thiserror::Error;

/// Retention policy written to unless configured otherwise.
pub const DEFAULT_RETENTION_POLICY: &str = "default";

/// Errors from a batch write. The batch has been dropped when one is returned.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("no store connection, {points} points dropped: {source}")]
    Connect {
        points: usize,
        #[source]
        source: StoreError,
    },

    #[error("write failed, {points} points dropped: {source}")]
    Write {
        points: usize,
        #[source]
        source: StoreError,
    },
}

impl WriteError {
    /// Number of points lost with the batch.
    pub fn points(&self) -> usize {
        match self {
            WriteError::Connect { points, .. } | WriteError::Write { points, .. } => *points,
        }
    }
}

/// What to do when a batch write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure. 0 = log and drop.
    pub max_retries: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, drop on failure.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Writer statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub batches_written: u64,
    pub points_written: u64,
    pub batches_dropped: u64,
    pub points_dropped: u64,
    pub retries: u64,
}

/// Turns record batches into store writes.
pub struct PointWriter<C: Connector> {
    connections: ConnectionManager<C>,
    database: String,
    retention_policy: String,
    retry: RetryPolicy,
    stats: WriterStats,
}

impl<C: Connector> PointWriter<C> {
    /// Create a writer targeting `database` with the default retention policy.
    pub fn new(connections: ConnectionManager<C>, database: impl Into<String>) -> Self {
        Self {
            connections,
            database: database.into(),
            retention_policy: DEFAULT_RETENTION_POLICY.to_string(),
            retry: RetryPolicy::none(),
            stats: WriterStats::default(),
        }
    }

    /// Write into a different retention policy.
    pub fn with_retention_policy(mut self, retention_policy: impl Into<String>) -> Self {
        self.retention_policy = retention_policy.into();
        self
    }

    /// Retry failed writes according to `retry`.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Write one batch. Returns the number of points written.
    ///
    /// An empty batch writes nothing and returns `Ok(0)`.
    pub fn write_batch(&mut self, records: &[CounterRecord]) -> Result<usize, WriteError> {
        let Some(first) = records.first() else {
            return Ok(0);
        };

        let request = WriteRequest {
            database: self.database.clone(),
            retention_policy: self.retention_policy.clone(),
            precision: Precision::Seconds,
            points: reshape_batch(records),
        };
        let points = request.points.len();

        let mut attempt = 0;
        loop {
            match self.submit(&request) {
                Ok(()) => {
                    self.stats.batches_written += 1;
                    self.stats.points_written += points as u64;
                    tracing::debug!(records = records.len(), points, "Chunk written");
                    return Ok(points);
                }
                Err(e) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    self.stats.retries += 1;
                    tracing::warn!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        backoff = ?self.retry.backoff,
                        error = %e,
                        "Chunk write failed, retrying"
                    );
                    std::thread::sleep(self.retry.backoff);
                }
                Err(e) => {
                    self.stats.batches_dropped += 1;
                    self.stats.points_dropped += points as u64;
                    tracing::error!(
                        records = records.len(),
                        points,
                        source = %first.source,
                        error = %e,
                        "Chunk dropped"
                    );
                    return Err(e);
                }
            }
        }
    }

    fn submit(&mut self, request: &WriteRequest) -> Result<(), WriteError> {
        let points = request.points.len();
        let client = self
            .connections
            .acquire()
            .map_err(|source| WriteError::Connect { points, source })?;

        tracing::info!(points, database = %request.database, "Inserting chunk");
        client
            .write(request)
            .map_err(|source| WriteError::Write { points, source })
    }

    /// Get the writer statistics.
    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    /// Get the connection manager.
    pub fn connections(&self) -> &ConnectionManager<C> {
        &self.connections
    }
}
