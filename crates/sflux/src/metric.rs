// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wide-to-tall reshape of counter records.
//!
//! A [`CounterRecord`] holds one row with many counter columns. The store
//! wants one named measurement per tag set and timestamp, so each record is
//! expanded into one [`MetricPoint`] per [`MetricField`].
//!
//! ```text
//! CounterRecord --> MetricField::ALL (11 accessors) --> [MetricPoint; 11]
//! ```

use crate::record::CounterRecord;
use std::fmt;

/// Tag key carrying the record source.
pub const TAG_SOURCE: &str = "Source";

/// Tag key carrying the interface index.
pub const TAG_IF_INDEX: &str = "IfIndex";

/// Field key holding the point value.
pub const VALUE_FIELD: &str = "value";

/// Counter columns shipped to the store, one measurement each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    IfInOctets,
    IfOutOctets,
    IfInDiscards,
    IfInBroadcastPkts,
    IfInMulticastPkts,
    IfInUcastPkts,
    IfOutUcastPkts,
    IfOutMulticastPkts,
    IfOutBroadcastPkts,
    IfOutDiscards,
    IfOutErrors,
}

impl MetricField {
    /// All shipped fields, in point emission order.
    pub const ALL: [MetricField; 11] = [
        MetricField::IfInOctets,
        MetricField::IfOutOctets,
        MetricField::IfInDiscards,
        MetricField::IfInBroadcastPkts,
        MetricField::IfInMulticastPkts,
        MetricField::IfInUcastPkts,
        MetricField::IfOutUcastPkts,
        MetricField::IfOutMulticastPkts,
        MetricField::IfOutBroadcastPkts,
        MetricField::IfOutDiscards,
        MetricField::IfOutErrors,
    ];

    /// Measurement name written to the store.
    pub fn name(self) -> &'static str {
        match self {
            MetricField::IfInOctets => "IfInOctets",
            MetricField::IfOutOctets => "IfOutOctets",
            MetricField::IfInDiscards => "IfInDiscards",
            MetricField::IfInBroadcastPkts => "IfInBroadcastPkts",
            MetricField::IfInMulticastPkts => "IfInMulticastPkts",
            MetricField::IfInUcastPkts => "IfInUcastPkts",
            MetricField::IfOutUcastPkts => "IfOutUcastPkts",
            MetricField::IfOutMulticastPkts => "IfOutMulticastPkts",
            MetricField::IfOutBroadcastPkts => "IfOutBroadcastPkts",
            MetricField::IfOutDiscards => "IfOutDiscards",
            MetricField::IfOutErrors => "IfOutErrors",
        }
    }

    /// Read this field's counter from a record.
    pub fn value(self, record: &CounterRecord) -> i64 {
        match self {
            MetricField::IfInOctets => record.if_in_octets,
            MetricField::IfOutOctets => record.if_out_octets,
            MetricField::IfInDiscards => record.if_in_discards,
            MetricField::IfInBroadcastPkts => record.if_in_broadcast_pkts,
            MetricField::IfInMulticastPkts => record.if_in_multicast_pkts,
            MetricField::IfInUcastPkts => record.if_in_ucast_pkts,
            MetricField::IfOutUcastPkts => record.if_out_ucast_pkts,
            MetricField::IfOutMulticastPkts => record.if_out_multicast_pkts,
            MetricField::IfOutBroadcastPkts => record.if_out_broadcast_pkts,
            MetricField::IfOutDiscards => record.if_out_discards,
            MetricField::IfOutErrors => record.if_out_errors,
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timestamp resolution of a point. Counter samples carry Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    Seconds,
}

impl Precision {
    /// Value of the `precision` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Seconds => "s",
        }
    }
}

/// One named, tagged, timestamped counter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricPoint {
    pub field: MetricField,
    pub source: String,
    pub if_index: String,
    pub value: i64,
    pub timestamp: i64,
    pub precision: Precision,
}

impl MetricPoint {
    /// Measurement name.
    pub fn measurement(&self) -> &'static str {
        self.field.name()
    }

    /// Tag set as key/value pairs.
    pub fn tags(&self) -> [(&'static str, &str); 2] {
        [
            (TAG_SOURCE, self.source.as_str()),
            (TAG_IF_INDEX, self.if_index.as_str()),
        ]
    }
}

/// Expand one record into one point per [`MetricField::ALL`] entry.
pub fn reshape(record: &CounterRecord) -> Vec<MetricPoint> {
    let mut points = Vec::with_capacity(MetricField::ALL.len());
    extend_points(&mut points, record);
    points
}

/// Expand a batch, keeping record order and field order within each record.
pub fn reshape_batch(records: &[CounterRecord]) -> Vec<MetricPoint> {
    tracing::debug!(
        points = records.len() * MetricField::ALL.len(),
        "allocating point buffer"
    );
    let mut points = Vec::with_capacity(records.len() * MetricField::ALL.len());
    for record in records {
        extend_points(&mut points, record);
    }
    points
}

fn extend_points(points: &mut Vec<MetricPoint>, record: &CounterRecord) {
    let if_index = record.if_index.to_string();
    for field in MetricField::ALL {
        let value = field.value(record);
        tracing::debug!(
            point = points.len(),
            counter = field.name(),
            source = %record.source,
            if_index = record.if_index,
            value,
            "create point"
        );
        points.push(MetricPoint {
            field,
            source: record.source.clone(),
            if_index: if_index.clone(),
            value,
            timestamp: record.timestamp,
            precision: Precision::Seconds,
        });
    }
}
