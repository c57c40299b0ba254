// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB Line Protocol encoding for metric points.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 value=42i timestamp
//! ```
//!
//! The timestamp unit is not part of the line; it travels as the
//! `precision` query parameter of the write request.
//!
//! See: <https://docs.influxdata.com/influxdb/v1/write_protocols/line_protocol_reference/>

use crate::metric::{MetricPoint, VALUE_FIELD};

/// Line Protocol body builder.
///
/// Points are appended one per line, in call order.
pub struct LineProtocolWriter {
    body: String,
    lines: usize,
}

impl LineProtocolWriter {
    /// Create a new empty writer.
    pub fn new() -> Self {
        Self {
            body: String::new(),
            lines: 0,
        }
    }

    /// Create a writer sized for roughly `points` lines.
    pub fn with_capacity(points: usize) -> Self {
        Self {
            body: String::with_capacity(points * 64),
            lines: 0,
        }
    }

    /// Append one point.
    pub fn write_point(&mut self, point: &MetricPoint) {
        if self.lines > 0 {
            self.body.push('\n');
        }

        self.body.push_str(&escape_measurement(point.measurement()));

        // Tags sorted by key for canonical form
        let mut tags = point.tags();
        tags.sort_by_key(|(k, _)| *k);
        for (key, value) in &tags {
            let value = escape_tag(value);
            // Empty tag values are not allowed by the store
            if value.is_empty() {
                continue;
            }
            self.body.push(',');
            self.body.push_str(&escape_tag(key));
            self.body.push('=');
            self.body.push_str(&value);
        }

        self.body.push(' ');
        self.body.push_str(VALUE_FIELD);
        self.body.push('=');
        self.body.push_str(&point.value.to_string());
        self.body.push('i');

        self.body.push(' ');
        self.body.push_str(&point.timestamp.to_string());

        self.lines += 1;
    }

    /// Consume the writer, returning the request body.
    pub fn finish(self) -> String {
        self.body
    }

    /// Get the number of encoded lines.
    pub fn len(&self) -> usize {
        self.lines
    }

    /// Check if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }
}

impl Default for LineProtocolWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a slice of points into one newline-separated body.
pub fn encode_points(points: &[MetricPoint]) -> String {
    let mut writer = LineProtocolWriter::with_capacity(points.len());
    for point in points {
        writer.write_point(point);
    }
    writer.finish()
}

/// Escape measurement name per Line Protocol spec.
/// Spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Escape tag key or value per Line Protocol spec.
/// Commas, equals signs, and spaces must be escaped.
///
/// Line Protocol has no escape for a backslash, so backslashes directly in
/// front of one of those characters, or at the end, are dropped: they would
/// otherwise swallow the following delimiter.
fn escape_tag(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut backslashes = 0;
    for c in s.chars() {
        match c {
            '\\' => {
                backslashes += 1;
                continue;
            }
            ',' | '=' | ' ' => out.push('\\'),
            _ => {
                for _ in 0..backslashes {
                    out.push('\\');
                }
            }
        }
        backslashes = 0;
        out.push(c);
    }
    out
}
