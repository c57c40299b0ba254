// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! sflux CLI
//!
//! Reads interface counter lines from stdin and writes them to InfluxDB.
//!
//! # Usage
//!
//! ```bash
//! # Ship a counter feed into the "ifstats" database
//! sflow-collector | sflux -d ifstats
//!
//! # Remote store with credentials, bigger chunks, debug logs
//! sflux -h influx.example.com -p 8086 -u ingest --password secret \
//!     -d ifstats --chunksize 500 --loglevel DEBUG
//!
//! # Settings from a YAML file, retry failed writes twice
//! sflux --config sflux.yaml --write-retries 2
//! ```

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use sflux::{Config, ConnectionManager, LogLevel, Pipeline, PointWriter, StopHandle};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sflux")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Write interface counter records from stdin to InfluxDB")]
#[command(long_about = None)]
#[command(disable_help_flag = true)]
struct Cli {
    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,

    /// YAML configuration file (flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Records per batch written to the database [default: 100]
    #[arg(long = "chunksize")]
    chunk_size: Option<usize>,

    /// InfluxDB host [default: localhost]
    #[arg(short = 'h', long)]
    host: Option<String>,

    /// InfluxDB port [default: 8086]
    #[arg(short, long)]
    port: Option<u16>,

    /// InfluxDB username
    #[arg(short, long)]
    user: Option<String>,

    /// InfluxDB password
    #[arg(long)]
    password: Option<String>,

    /// Database to write to
    #[arg(short, long)]
    database: Option<String>,

    /// Retention policy to write to [default: default]
    #[arg(long)]
    retention_policy: Option<String>,

    /// Timeout for pings and writes in milliseconds [default: 5000]
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Extra attempts for a failed batch write before dropping it [default: 0]
    #[arg(long)]
    write_retries: Option<u32>,

    /// Pause between write attempts in milliseconds [default: 1000]
    #[arg(long)]
    retry_backoff_ms: Option<u64>,

    /// Log level: ERROR, WARN, INFO, DEBUG (or 0-3) [default: INFO]
    #[arg(long = "loglevel")]
    log_level: Option<LogLevel>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = build_config(&cli)?;
    config.validate().context("Invalid configuration")?;

    // Data arrives on stdin, logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter()));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        log_level = %config.log_level,
        chunk_size = config.chunk_size,
        host = %config.influxdb.host,
        port = config.influxdb.port,
        database = %config.influxdb.database,
        retention_policy = %config.influxdb.retention_policy,
        write_retries = config.influxdb.write_retries,
        "Starting sflux"
    );

    let mut connections = ConnectionManager::new(config.influxdb.connector());
    connections
        .acquire()
        .context("InfluxDB is not reachable at startup")?;

    let writer = PointWriter::new(connections, config.influxdb.database.clone())
        .with_retention_policy(config.influxdb.retention_policy.clone())
        .with_retry(config.influxdb.retry_policy());

    let stdin = std::io::stdin();
    let mut pipeline = Pipeline::new(stdin.lock(), writer, config.chunk_size);
    ctrlc_handler(pipeline.stop_handle());

    let stats = pipeline.run().context("Failed to read input")?;

    tracing::info!(
        chunks = stats.chunks,
        records = stats.records,
        malformed = stats.malformed,
        points_written = stats.points_written,
        points_dropped = stats.points_dropped,
        reconnects = pipeline.writer().connections().reconnects(),
        "sflux shutdown complete"
    );

    Ok(())
}

/// Merge the optional config file with command-line flags.
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    let influx = &mut config.influxdb;
    if let Some(ref host) = cli.host {
        influx.host = host.clone();
    }
    if let Some(port) = cli.port {
        influx.port = port;
    }
    if let Some(ref user) = cli.user {
        influx.username = user.clone();
    }
    if let Some(ref password) = cli.password {
        influx.password = password.clone();
    }
    if let Some(ref database) = cli.database {
        influx.database = database.clone();
    }
    if let Some(ref rp) = cli.retention_policy {
        influx.retention_policy = rp.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        influx.timeout_ms = timeout_ms;
    }
    if let Some(retries) = cli.write_retries {
        influx.write_retries = retries;
    }
    if let Some(backoff_ms) = cli.retry_backoff_ms {
        influx.retry_backoff_ms = backoff_ms;
    }

    Ok(config)
}

/// Setup Ctrl+C handler.
fn ctrlc_handler(stop_handle: StopHandle) {
    let _ = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, stopping after the current chunk...");
        stop_handle.stop();
    });
}
