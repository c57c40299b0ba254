// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Positional decoding of interface counter lines.
//!
//! One input line carries one sample of an interface's counters:
//!
//! ```text
//! <epoch>[ <anything>],<source>,<ifIndex>,<ifType>,<ifSpeed>,<ifDirection>,<ifStatus>,
//! <ifInOctets>,<ifInUcastPkts>,<ifInMulticastPkts>,<ifInBroadcastPkts>,<ifInDiscards>,
//! <ifInErrors>,<ifInUnknownProtos>,<ifOutOctets>,<ifOutUcastPkts>,<ifOutMulticastPkts>,
//! <ifOutBroadcastPkts>,<ifOutDiscards>,<ifOutErrors>,<ifPromiscuousMode>
//! ```
//!
//! Numeric columns are decoded best-effort: text that is not an integer
//! becomes `0` instead of rejecting the record. Only a line with too few
//! columns is rejected.

use thiserror::Error;

/// Number of integer columns following the source column.
pub const COUNTER_COLUMNS: usize = 19;

/// Minimum number of comma-separated columns in a well-formed line.
pub const MIN_COLUMNS: usize = COUNTER_COLUMNS + 2;

/// Record decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed record: expected at least {expected} columns, found {found}")]
    TooFewFields { expected: usize, found: usize },
}

/// One sample of a network interface's counters at an instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterRecord {
    pub source: String,
    pub if_index: i64,
    pub if_type: i64,
    pub if_speed: i64,
    /// 0 = unknown, 1 = full-duplex, 2 = half-duplex, 3 = in, 4 = out (RFC 2668).
    pub if_direction: i64,
    pub if_status: i64,
    pub if_in_octets: i64,
    pub if_in_ucast_pkts: i64,
    pub if_in_multicast_pkts: i64,
    pub if_in_broadcast_pkts: i64,
    pub if_in_discards: i64,
    pub if_in_errors: i64,
    pub if_in_unknown_protos: i64,
    pub if_out_octets: i64,
    pub if_out_ucast_pkts: i64,
    pub if_out_multicast_pkts: i64,
    pub if_out_broadcast_pkts: i64,
    pub if_out_discards: i64,
    pub if_out_errors: i64,
    pub if_promiscuous_mode: i64,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

impl CounterRecord {
    /// Counter columns in input order.
    pub fn counters(&self) -> [i64; COUNTER_COLUMNS] {
        [
            self.if_index,
            self.if_type,
            self.if_speed,
            self.if_direction,
            self.if_status,
            self.if_in_octets,
            self.if_in_ucast_pkts,
            self.if_in_multicast_pkts,
            self.if_in_broadcast_pkts,
            self.if_in_discards,
            self.if_in_errors,
            self.if_in_unknown_protos,
            self.if_out_octets,
            self.if_out_ucast_pkts,
            self.if_out_multicast_pkts,
            self.if_out_broadcast_pkts,
            self.if_out_discards,
            self.if_out_errors,
            self.if_promiscuous_mode,
        ]
    }

    /// Render the record back into its canonical input line.
    ///
    /// Anything that followed the epoch in the first column is not kept,
    /// and coerced numeric columns come back as `0`.
    pub fn to_line(&self) -> String {
        let mut line = format!("{},{}", self.timestamp, self.source);
        for value in self.counters() {
            line.push(',');
            line.push_str(&value.to_string());
        }
        line
    }
}

/// Decode one input line into a [`CounterRecord`].
///
/// Columns past the 21st are ignored. A trailing `\r` is stripped.
pub fn parse_line(line: &str) -> Result<CounterRecord, ParseError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let columns: Vec<&str> = line.split(',').collect();
    if columns.len() < MIN_COLUMNS {
        return Err(ParseError::TooFewFields {
            expected: MIN_COLUMNS,
            found: columns.len(),
        });
    }

    let epoch = columns[0].split(' ').next().unwrap_or_default();
    let c = |i: usize| parse_int(columns[2 + i]);

    Ok(CounterRecord {
        source: columns[1].to_string(),
        if_index: c(0),
        if_type: c(1),
        if_speed: c(2),
        if_direction: c(3),
        if_status: c(4),
        if_in_octets: c(5),
        if_in_ucast_pkts: c(6),
        if_in_multicast_pkts: c(7),
        if_in_broadcast_pkts: c(8),
        if_in_discards: c(9),
        if_in_errors: c(10),
        if_in_unknown_protos: c(11),
        if_out_octets: c(12),
        if_out_ucast_pkts: c(13),
        if_out_multicast_pkts: c(14),
        if_out_broadcast_pkts: c(15),
        if_out_discards: c(16),
        if_out_errors: c(17),
        if_promiscuous_mode: c(18),
        timestamp: parse_int(epoch),
    })
}

/// Tolerant integer decoding.
///
/// Accepts an optional sign followed by a decimal number or a prefixed
/// literal (`0x`/`0X` hex, `0b` binary, `0o` or a bare leading `0` for
/// octal). Underscores are allowed between digits. Anything else decodes
/// to `0`.
///
/// Values outside the `i64` range also decode to `0`, never to the nearest
/// bound.
pub fn parse_int(text: &str) -> i64 {
    try_parse_int(text).unwrap_or(0)
}

fn try_parse_int(text: &str) -> Option<i64> {
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let lower = unsigned.to_ascii_lowercase();
    let (radix, digits, prefixed) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest, true)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest, true)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest, true)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..], true)
    } else {
        (10, lower.as_str(), false)
    };

    let cleaned = strip_underscores(digits, prefixed)?;
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }

    let magnitude = u64::from_str_radix(&cleaned, radix).ok()?;
    if negative {
        if magnitude == i64::MIN.unsigned_abs() {
            Some(i64::MIN)
        } else {
            i64::try_from(magnitude).ok().map(|v| -v)
        }
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// Remove digit separators, rejecting misplaced ones.
///
/// An underscore must sit between two digits, or directly after a base
/// prefix and before a digit.
fn strip_underscores(digits: &str, prefixed: bool) -> Option<String> {
    if !digits.contains('_') {
        return Some(digits.to_string());
    }
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(digits.len());
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'_' {
            out.push(b as char);
            continue;
        }
        let after_digit = if i == 0 {
            prefixed
        } else {
            bytes[i - 1].is_ascii_alphanumeric()
        };
        let before_digit = bytes.get(i + 1).is_some_and(u8::is_ascii_alphanumeric);
        if !(after_digit && before_digit) {
            return None;
        }
    }
    Some(out)
}
