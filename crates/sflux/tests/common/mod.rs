// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory store shared by the integration tests.

#![allow(dead_code)]

use sflux::{Connector, Pong, StoreClient, StoreError, WriteRequest};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

#[derive(Default)]
pub struct MemoryState {
    pub connects: usize,
    pub pings: usize,
    pub dead: HashSet<usize>,
    pub fail_writes: usize,
    pub writes: Vec<(usize, WriteRequest)>,
}

/// Connector handing out clients that record writes into shared state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub state: Rc<RefCell<MemoryState>>,
}

impl MemoryStore {
    /// Make every client opened so far fail its next probe.
    pub fn kill_clients(&self) {
        let mut state = self.state.borrow_mut();
        let opened = state.connects;
        state.dead.extend(1..=opened);
    }

    pub fn write_sizes(&self) -> Vec<usize> {
        self.state
            .borrow()
            .writes
            .iter()
            .map(|(_, request)| request.points.len())
            .collect()
    }
}

pub struct MemoryClient {
    pub id: usize,
    state: Rc<RefCell<MemoryState>>,
}

impl Connector for MemoryStore {
    type Client = MemoryClient;

    fn connect(&self) -> Result<MemoryClient, StoreError> {
        let mut state = self.state.borrow_mut();
        state.connects += 1;
        Ok(MemoryClient {
            id: state.connects,
            state: Rc::clone(&self.state),
        })
    }

    fn target(&self) -> String {
        "memory://".to_string()
    }
}

impl StoreClient for MemoryClient {
    fn ping(&self) -> Result<Pong, StoreError> {
        let mut state = self.state.borrow_mut();
        state.pings += 1;
        if state.dead.contains(&self.id) {
            return Err(StoreError::Status {
                status: 503,
                message: "stale connection".to_string(),
            });
        }
        Ok(Pong {
            rtt: Duration::from_micros(250),
            version: "1.8.10".to_string(),
        })
    }

    fn write(&self, request: &WriteRequest) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes > 0 {
            state.fail_writes -= 1;
            return Err(StoreError::Status {
                status: 500,
                message: "timeout".to_string(),
            });
        }
        state.writes.push((self.id, request.clone()));
        Ok(())
    }
}

/// A well-formed counter line for interface `index` at `ts`.
pub fn counter_line(ts: u64, source: &str, index: u32) -> String {
    format!(
        "{} poll,{},{},6,1000000000,1,1,{},{},3,4,5,6,7,{},{},10,11,12,13,0",
        ts,
        source,
        index,
        1000 + index,
        2000 + index,
        3000 + index,
        4000 + index
    )
}
