// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! End-to-end ingestion tests against an in-memory store.
//!
//! # Test Coverage
//!
//! - Single record, chunk size 1, 11 points with tags and timestamp
//! - 250 records with chunk size 100 split into 100/100/50
//! - Short lines rejected without stopping the stream
//! - Stale pooled connection replaced before the next write
//! - Write failure drops only the affected chunk

mod common;

use common::{counter_line, MemoryStore};
use sflux::{
    ConnectionManager, ConnectionState, MetricField, Pipeline, PointWriter, Precision,
    RecordBatcher,
};
use std::io::Cursor;

const POLLED_LINE: &str = "1700000000 x,eth0,1,6,1000,1,1,10,20,0,0,0,0,0,5,6,0,0,1,1,0";

fn pipeline(
    input: String,
    store: &MemoryStore,
    chunk: usize,
) -> Pipeline<Cursor<String>, MemoryStore> {
    let writer = PointWriter::new(ConnectionManager::new(store.clone()), "ifstats");
    Pipeline::new(Cursor::new(input), writer, chunk)
}

#[test]
fn test_single_record_becomes_eleven_points() {
    let store = MemoryStore::default();
    let input = String::from(POLLED_LINE) + "\n";

    let stats = pipeline(input, &store, 1).run().expect("run");
    assert_eq!(stats.chunks, 1);
    assert_eq!(stats.records, 1);

    let state = store.state.borrow();
    assert_eq!(state.writes.len(), 1);
    let request = &state.writes[0].1;
    assert_eq!(request.database, "ifstats");
    assert_eq!(request.retention_policy, "default");
    assert_eq!(request.points.len(), 11);

    let first = &request.points[0];
    assert_eq!(first.measurement(), "IfInOctets");
    assert_eq!(first.tags(), [("Source", "eth0"), ("IfIndex", "1")]);
    assert_eq!(first.value, 10);
    assert_eq!(first.timestamp, 1_700_000_000);
    assert_eq!(first.precision, Precision::Seconds);

    let names: Vec<MetricField> = request.points.iter().map(|p| p.field).collect();
    assert_eq!(names, MetricField::ALL.to_vec());
    assert_eq!(request.points[1].value, 5); // IfOutOctets
    assert_eq!(request.points[10].value, 1); // IfOutErrors
}

#[test]
fn test_250_records_in_chunks_of_100() {
    let store = MemoryStore::default();
    let input: String = (0..250)
        .map(|i| counter_line(1_700_000_000 + i, "core1", (i % 48) as u32) + "\n")
        .collect();

    let stats = pipeline(input, &store, 100).run().expect("run");
    assert_eq!(stats.chunks, 3);
    assert_eq!(stats.records, 250);
    assert_eq!(stats.points_written, 2750);
    assert_eq!(store.write_sizes(), vec![1100, 1100, 550]);

    // Batch order is preserved across writes
    let state = store.state.borrow();
    let timestamps: Vec<i64> = state
        .writes
        .iter()
        .flat_map(|(_, r)| r.points.iter().step_by(11).map(|p| p.timestamp))
        .collect();
    let expected: Vec<i64> = (0..250).map(|i| 1_700_000_000 + i).collect();
    assert_eq!(timestamps, expected);
}

#[test]
fn test_short_line_is_skipped() {
    let store = MemoryStore::default();
    let input = format!(
        "{}\n1700000001,eth1,1,6,1000\n{}\n",
        counter_line(1_700_000_000, "sw", 1),
        counter_line(1_700_000_002, "sw", 2)
    );

    let stats = pipeline(input, &store, 10).run().expect("run");
    assert_eq!(stats.records, 2);
    assert_eq!(stats.malformed, 1);
    assert_eq!(store.write_sizes(), vec![22]);
}

#[test]
fn test_stale_connection_is_replaced_before_write() {
    let store = MemoryStore::default();
    let manager = ConnectionManager::new(store.clone());
    let mut writer = PointWriter::new(manager, "ifstats");

    let mut batcher = RecordBatcher::new(Cursor::new(format!(
        "{}\n{}\n",
        counter_line(1_700_000_000, "edge", 1),
        counter_line(1_700_000_060, "edge", 1)
    )));

    let first = batcher.next_batch(1).expect("read").expect("batch");
    writer.write_batch(&first).expect("first write");

    // The store restarts between batches
    store.kill_clients();

    let second = batcher.next_batch(1).expect("read").expect("batch");
    writer.write_batch(&second).expect("second write");

    assert_eq!(writer.connections().reconnects(), 1);
    assert_eq!(writer.connections().state(), ConnectionState::Connected);

    let state = store.state.borrow();
    assert_eq!(state.connects, 2);
    let clients: Vec<usize> = state.writes.iter().map(|(id, _)| *id).collect();
    assert_eq!(clients, vec![1, 2]);
}

#[test]
fn test_failed_write_drops_only_that_chunk() {
    let store = MemoryStore::default();
    store.state.borrow_mut().fail_writes = 1;
    let input: String = (0..3)
        .map(|i| counter_line(1_700_000_000 + i, "sw", 1) + "\n")
        .collect();

    let stats = pipeline(input, &store, 1).run().expect("run");
    assert_eq!(stats.chunks, 3);
    assert_eq!(stats.chunks_dropped, 1);
    assert_eq!(stats.points_dropped, 11);

    let state = store.state.borrow();
    let timestamps: Vec<i64> = state
        .writes
        .iter()
        .map(|(_, r)| r.points[0].timestamp)
        .collect();
    assert_eq!(timestamps, vec![1_700_000_001, 1_700_000_002]);
}
