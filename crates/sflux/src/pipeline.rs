// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ingestion loop: read a chunk, write it, repeat.
//!
//! One chunk is in flight at a time. A stop request is honored between
//! chunks, never in the middle of a write.

use crate::batch::RecordBatcher;
use crate::client::Connector;
use crate::writer::PointWriter;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default number of records per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Summary of a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Non-empty chunks handed to the writer.
    pub chunks: u64,
    /// Records parsed.
    pub records: u64,
    /// Lines rejected as malformed.
    pub malformed: u64,
    /// Points accepted by the store.
    pub points_written: u64,
    /// Chunks lost to connect or write failures.
    pub chunks_dropped: u64,
    /// Points lost to connect or write failures.
    pub points_dropped: u64,
    /// True if a stop request ended the run before end of input.
    pub stopped: bool,
}

/// Drives records from a reader into the store.
pub struct Pipeline<R, C: Connector> {
    batcher: RecordBatcher<R>,
    writer: PointWriter<C>,
    chunk_size: usize,
    running: Arc<AtomicBool>,
}

impl<R: BufRead, C: Connector> Pipeline<R, C> {
    /// Create a pipeline reading `chunk_size` records per write.
    pub fn new(reader: R, writer: PointWriter<C>, chunk_size: usize) -> Self {
        Self {
            batcher: RecordBatcher::new(reader),
            writer,
            chunk_size: chunk_size.max(1),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Get a handle to stop the pipeline from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: self.running.clone(),
        }
    }

    /// Run until the input is exhausted or a stop is requested.
    ///
    /// Connect and write failures drop the affected chunk and do not end the
    /// run. Only a read error on the input does, after the records read
    /// before it have been written.
    pub fn run(&mut self) -> io::Result<PipelineStats> {
        let mut stats = PipelineStats::default();

        tracing::info!(chunk_size = self.chunk_size, "Starting ingestion");

        loop {
            if !self.running.load(Ordering::SeqCst) {
                tracing::info!("Stop requested, leaving ingestion loop");
                stats.stopped = true;
                break;
            }

            let Some(chunk) = self.batcher.next_batch(self.chunk_size)? else {
                break;
            };
            stats.chunks += 1;

            tracing::debug!(chunk = stats.chunks, records = chunk.len(), "Chunk ready");
            // Failures are logged by the writer; the chunk is gone either way.
            let _ = self.writer.write_batch(&chunk);
        }

        let written = self.writer.stats();
        stats.records = self.batcher.records();
        stats.malformed = self.batcher.malformed();
        stats.points_written = written.points_written;
        stats.chunks_dropped = written.batches_dropped;
        stats.points_dropped = written.points_dropped;

        tracing::info!(
            chunks = stats.chunks,
            records = stats.records,
            malformed = stats.malformed,
            points_written = stats.points_written,
            chunks_dropped = stats.chunks_dropped,
            "Ingestion finished"
        );

        Ok(stats)
    }

    /// Get the writer.
    pub fn writer(&self) -> &PointWriter<C> {
        &self.writer
    }
}

/// Handle to stop a running pipeline.
#[derive(Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request a stop. Takes effect before the next chunk is read.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether a stop was requested.
    pub fn is_stopped(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeConnector;
    use crate::connection::ConnectionManager;
    use std::io::{BufReader, Cursor, Read};

    fn line(i: usize) -> String {
        format!(
            "{},eth0,{},6,1000,1,1,10,20,0,0,0,0,0,5,6,0,0,1,1,0\n",
            1_700_000_000 + i,
            i
        )
    }

    fn lines(n: usize) -> String {
        (0..n).map(line).collect()
    }

    fn writer(connector: &FakeConnector) -> PointWriter<FakeConnector> {
        PointWriter::new(ConnectionManager::new(connector.clone()), "ifstats")
    }

    fn pipeline(
        text: String,
        connector: &FakeConnector,
        chunk: usize,
    ) -> Pipeline<Cursor<String>, FakeConnector> {
        Pipeline::new(Cursor::new(text), writer(connector), chunk)
    }

    /// Input whose every read fails.
    struct Unreadable;

    impl Read for Unreadable {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("stdin closed with error"))
        }
    }

    #[test]
    fn test_pipeline_writes_every_chunk() {
        let connector = FakeConnector::default();
        let mut pipeline = pipeline(lines(25), &connector, 10);

        let stats = pipeline.run().expect("run");
        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.records, 25);
        assert_eq!(stats.points_written, 25 * 11);
        assert!(!stats.stopped);

        let sizes: Vec<usize> = connector
            .state
            .borrow()
            .writes
            .iter()
            .map(|(_, r)| r.points.len())
            .collect();
        assert_eq!(sizes, vec![110, 110, 55]);
    }

    #[test]
    fn test_pipeline_empty_input_writes_nothing() {
        let connector = FakeConnector::default();
        let mut pipeline = pipeline(String::new(), &connector, 10);

        let stats = pipeline.run().expect("run");
        assert_eq!(stats, PipelineStats::default());
        assert_eq!(connector.state.borrow().connects, 0);
    }

    #[test]
    fn test_pipeline_continues_after_failed_write() {
        let connector = FakeConnector::default();
        connector.state.borrow_mut().fail_writes = 1;
        let mut pipeline = pipeline(lines(3), &connector, 1);

        let stats = pipeline.run().expect("run");
        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.chunks_dropped, 1);
        assert_eq!(stats.points_dropped, 11);
        assert_eq!(stats.points_written, 22);
    }

    #[test]
    fn test_pipeline_stop_before_run_reads_nothing() {
        let connector = FakeConnector::default();
        let mut pipeline = pipeline(lines(3), &connector, 1);

        let handle = pipeline.stop_handle();
        handle.stop();
        assert!(handle.is_stopped());

        let stats = pipeline.run().expect("run");
        assert!(stats.stopped);
        assert_eq!(stats.chunks, 0);
        assert!(connector.state.borrow().writes.is_empty());
    }

    #[test]
    fn test_pipeline_stop_during_write_ends_after_chunk() {
        let connector = FakeConnector::default();
        let mut pipeline = pipeline(lines(3), &connector, 1);
        connector.state.borrow_mut().stop_on_write = Some(pipeline.stop_handle());

        let stats = pipeline.run().expect("run");
        assert!(stats.stopped);
        assert_eq!(stats.chunks, 1);
        assert_eq!(stats.points_written, 11);
        assert_eq!(connector.state.borrow().writes.len(), 1);
    }

    #[test]
    fn test_pipeline_writes_records_read_before_input_error() {
        let connector = FakeConnector::default();
        let input = BufReader::new(Cursor::new(lines(2)).chain(Unreadable));
        let mut pipeline = Pipeline::new(input, writer(&connector), 10);

        let err = pipeline.run().unwrap_err();
        assert_eq!(err.to_string(), "stdin closed with error");

        let state = connector.state.borrow();
        assert_eq!(state.writes.len(), 1);
        assert_eq!(state.writes[0].1.points.len(), 22);
    }
}
