// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recording fakes shared by the integration tests.
//!
//! Each fake is a cheap handle: clones share the same record, so a test keeps
//! one clone while the engine owns the other.

#![allow(dead_code)]

use std::sync::Arc;

use ledlink::error::LinkError;
use ledlink::port::{Actuator, PeerLink};
use ledlink::types::PowerLevel;
use parking_lot::Mutex;

/// One actuator write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    Digital(bool),
    Pwm(u8),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    writes: Arc<Mutex<Vec<Drive>>>,
}

impl RecordingActuator {
    pub fn writes(&self) -> Vec<Drive> {
        self.writes.lock().clone()
    }

    pub fn last(&self) -> Option<Drive> {
        self.writes.lock().last().copied()
    }

    pub fn clear(&self) {
        self.writes.lock().clear();
    }
}

impl Actuator for RecordingActuator {
    fn set_digital_output(&mut self, active: bool) {
        self.writes.lock().push(Drive::Digital(active));
    }

    fn set_pwm_level(&mut self, level: PowerLevel) {
        self.writes.lock().push(Drive::Pwm(level.value()));
    }
}

#[derive(Debug, Default)]
struct LinkRecord {
    sent: Vec<String>,
    disconnects: usize,
    advertising: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingLink {
    record: Arc<Mutex<LinkRecord>>,
}

impl RecordingLink {
    pub fn sent(&self) -> Vec<String> {
        self.record.lock().sent.clone()
    }

    pub fn disconnects(&self) -> usize {
        self.record.lock().disconnects
    }

    pub fn advertising(&self) -> usize {
        self.record.lock().advertising
    }

    pub fn clear(&self) {
        self.record.lock().sent.clear();
    }
}

impl PeerLink for RecordingLink {
    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        let text = String::from_utf8(payload.to_vec())
            .map_err(|e| LinkError::SendFailed(e.to_string()))?;
        self.record.lock().sent.push(text);
        Ok(())
    }

    fn disconnect_peer(&mut self) {
        self.record.lock().disconnects += 1;
    }

    fn start_advertising(&mut self) {
        self.record.lock().advertising += 1;
    }
}
