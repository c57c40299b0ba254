// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded batching of counter records from a line stream.
//!
//! A batch is returned as soon as it holds the requested number of records,
//! so memory stays bounded no matter how long the stream is. When the stream
//! ends the partial batch is returned, then `None`.
//!
//! Malformed lines are skipped: they are logged, counted, and the batch
//! keeps filling from the following lines.
//!
//! A read error in the middle of a batch does not lose the records already
//! collected: the partial batch is returned and the error is reported by
//! the next call.

use crate::record::{parse_line, CounterRecord};
use std::io::{self, BufRead};

/// Pulls parsed [`CounterRecord`]s out of a line-oriented reader.
pub struct RecordBatcher<R> {
    reader: R,
    line: Vec<u8>,
    lines_read: u64,
    records: u64,
    malformed: u64,
    exhausted: bool,
    pending_error: Option<io::Error>,
}

impl<R: BufRead> RecordBatcher<R> {
    /// Create a batcher over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            lines_read: 0,
            records: 0,
            malformed: 0,
            exhausted: false,
            pending_error: None,
        }
    }

    /// Read up to `n` records.
    ///
    /// Returns `Ok(None)` once the stream is exhausted and no record is
    /// pending. `n == 0` is treated as `1`.
    ///
    /// A read error with records already collected yields those records;
    /// the error itself is returned by the following call.
    pub fn next_batch(&mut self, n: usize) -> io::Result<Option<Vec<CounterRecord>>> {
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }

        let n = n.max(1);
        let mut batch = Vec::with_capacity(n);

        while batch.len() < n {
            let text = match self.next_line() {
                Ok(Some(text)) => text,
                Ok(None) => break,
                Err(e) if batch.is_empty() => return Err(e),
                Err(e) => {
                    tracing::error!(
                        line = self.lines_read,
                        records = batch.len(),
                        error = %e,
                        "Input read failed, returning partial chunk"
                    );
                    self.exhausted = true;
                    self.pending_error = Some(e);
                    break;
                }
            };
            match parse_line(&text) {
                Ok(record) => {
                    self.records += 1;
                    batch.push(record);
                }
                Err(e) => {
                    self.malformed += 1;
                    tracing::error!(
                        line = self.lines_read,
                        error = %e,
                        "Skipping malformed record"
                    );
                }
            }
        }

        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }

    /// Next line without its terminator. Invalid UTF-8 is replaced, not rejected.
    fn next_line(&mut self) -> io::Result<Option<String>> {
        if self.exhausted {
            return Ok(None);
        }

        self.line.clear();
        if self.reader.read_until(b'\n', &mut self.line)? == 0 {
            self.exhausted = true;
            return Ok(None);
        }
        self.lines_read += 1;

        if self.line.last() == Some(&b'\n') {
            self.line.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.line).into_owned()))
    }

    /// Lines consumed so far.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Records parsed successfully so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Lines rejected as malformed so far.
    pub fn malformed(&self) -> u64 {
        self.malformed
    }
}
