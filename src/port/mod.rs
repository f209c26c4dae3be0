// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capability traits for the platform bindings.
//!
//! The engine never references concrete platform types. A deployment
//! supplies one implementation of each trait:
//!
//! - [`PersistentStateStore`] - integer key/value storage (NVS, flash, a file)
//! - [`Actuator`] - the physical output (GPIO or PWM channel)
//! - [`PeerLink`] - outbound half of the wireless transport
//!
//! Inbound transport callbacks are delivered as
//! [`LinkEvent`](crate::session::LinkEvent)s.
//!
//! [`MemoryStore`] and [`JsonFileStore`] are ready-made stores for tests and
//! host builds.

mod file_store;
mod memory_store;

pub use file_store::JsonFileStore;
pub use memory_store::MemoryStore;

use crate::error::{LinkError, StoreError};
use crate::types::PowerLevel;

/// Integer key/value storage that survives restarts.
pub trait PersistentStateStore {
    /// Reads `key`, returning `default` if it has never been written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    fn get(&self, key: &str, default: u32) -> Result<u32, StoreError>;

    /// Writes `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn put(&mut self, key: &str, value: u32) -> Result<(), StoreError>;
}

/// The physical output.
///
/// Exactly one of the two methods is exercised, depending on the deployment's
/// [`OutputVariant`](crate::types::OutputVariant).
pub trait Actuator {
    /// Drives a digital output to its active or inactive level.
    fn set_digital_output(&mut self, active: bool);

    /// Sets the PWM duty; `PowerLevel::MIN` is inactive.
    fn set_pwm_level(&mut self, level: PowerLevel);
}

/// Outbound half of the wireless transport.
pub trait PeerLink {
    /// Notifies the connected peer.
    ///
    /// # Errors
    ///
    /// Returns `LinkError` if the notification cannot be delivered.
    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError>;

    /// Drops the connected peer. Must be a no-op with no peer connected.
    fn disconnect_peer(&mut self);

    /// Resumes advertising so a new peer can connect.
    fn start_advertising(&mut self);
}

impl<T: PersistentStateStore + ?Sized> PersistentStateStore for Box<T> {
    fn get(&self, key: &str, default: u32) -> Result<u32, StoreError> {
        (**self).get(key, default)
    }

    fn put(&mut self, key: &str, value: u32) -> Result<(), StoreError> {
        (**self).put(key, value)
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn set_digital_output(&mut self, active: bool) {
        (**self).set_digital_output(active);
    }

    fn set_pwm_level(&mut self, level: PowerLevel) {
        (**self).set_pwm_level(level);
    }
}

impl<T: PeerLink + ?Sized> PeerLink for Box<T> {
    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        (**self).send(payload)
    }

    fn disconnect_peer(&mut self) {
        (**self).disconnect_peer();
    }

    fn start_advertising(&mut self) {
        (**self).start_advertising();
    }
}
