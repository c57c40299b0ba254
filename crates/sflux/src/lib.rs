// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! sflux: interface counters to InfluxDB
//!
//! Reads wide interface-counter records (one CSV line per interface sample)
//! from a stream and writes them to InfluxDB as tall points, one measurement
//! per counter.
//!
//! This crate provides:
//! - Positional, best-effort parsing of counter lines
//! - Bounded batching of an unbounded input stream
//! - A compile-time checked wide-to-tall reshape
//! - A probe-before-reuse store connection with single reconnect
//! - InfluxDB 1.x HTTP writes in Line Protocol
//!
//! # Overview
//!
//! ```text
//! stdin --> RecordBatcher --> PointWriter --reshape--> ConnectionManager --> InfluxDB
//!              (chunk)                                   (ping, reconnect)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use sflux::{Config, ConnectionManager, Pipeline, PointWriter};
//!
//! let config = Config::from_file("sflux.yaml".as_ref())?;
//! let manager = ConnectionManager::new(config.influxdb.connector());
//! let writer = PointWriter::new(manager, &config.influxdb.database);
//! let stats = Pipeline::new(std::io::stdin().lock(), writer, config.chunk_size).run()?;
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod connection;
pub mod line_protocol;
pub mod metric;
pub mod pipeline;
pub mod record;
pub mod writer;

pub use batch::RecordBatcher;
pub use client::{
    Connector, HttpClient, HttpConnector, Pong, StoreClient, StoreError, WriteRequest,
};
pub use config::{Config, ConfigError, InfluxDbConfig, LogLevel};
pub use connection::{ConnectionManager, ConnectionState};
pub use metric::{reshape, reshape_batch, MetricField, MetricPoint, Precision};
pub use pipeline::{Pipeline, PipelineStats, StopHandle};
pub use record::{parse_line, CounterRecord, ParseError};
pub use writer::{PointWriter, RetryPolicy, WriteError, WriterStats};
