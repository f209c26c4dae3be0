// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::port::PersistentStateStore;
use crate::types::{Mode, PowerLevel};

/// Store keys for the three persisted fields.
///
/// All three default independently on first boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateKeys {
    /// Key for the on/off flag (0/1).
    pub output: String,
    /// Key for the power level (0-255).
    pub power_level: String,
    /// Key for the mode (0/1).
    pub mode: String,
}

impl Default for StateKeys {
    fn default() -> Self {
        Self {
            output: "ledState".to_string(),
            power_level: "ledPower".to_string(),
            mode: "ledMode".to_string(),
        }
    }
}

/// The controllable output's state.
///
/// # Invariants
///
/// - the power level is always within 0-255 (enforced by [`PowerLevel`])
/// - a disabled output is driven inactive regardless of level and mode
///   (enforced by [`OutputDriver`](crate::output::OutputDriver))
///
/// The default is off, full power, static.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceState {
    output_enabled: bool,
    power_level: PowerLevel,
    mode: Mode,
}

impl DeviceState {
    /// Creates a state from its three fields.
    #[must_use]
    pub const fn new(output_enabled: bool, power_level: PowerLevel, mode: Mode) -> Self {
        Self {
            output_enabled,
            power_level,
            mode,
        }
    }

    /// Returns `true` if the output is logically on.
    #[must_use]
    pub const fn output_enabled(&self) -> bool {
        self.output_enabled
    }

    /// Sets the on/off flag.
    pub fn set_output_enabled(&mut self, enabled: bool) {
        self.output_enabled = enabled;
    }

    /// Returns the PWM duty target.
    #[must_use]
    pub const fn power_level(&self) -> PowerLevel {
        self.power_level
    }

    /// Sets the PWM duty target.
    pub fn set_power_level(&mut self, level: PowerLevel) {
        self.power_level = level;
    }

    /// Returns the output mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Sets the output mode.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Returns `true` if the output should currently be toggling.
    #[must_use]
    pub fn is_blinking(&self) -> bool {
        self.output_enabled && self.mode == Mode::Blinking
    }

    /// Loads the state from `store`, falling back to `defaults` per field.
    ///
    /// A field that cannot be read or holds an out-of-range value takes its
    /// default; loading never fails.
    #[must_use]
    pub fn load<S: PersistentStateStore + ?Sized>(
        store: &S,
        keys: &StateKeys,
        defaults: &Self,
    ) -> Self {
        let read = |key: &str, default: u32| match store.get(key, default) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read persisted state, using default");
                default
            }
        };

        let output_enabled = match read(&keys.output, u32::from(defaults.output_enabled)) {
            0 => false,
            1 => true,
            other => {
                tracing::warn!(key = %keys.output, value = other, "Invalid persisted output flag");
                defaults.output_enabled
            }
        };

        let power_level = PowerLevel::clamped(read(
            &keys.power_level,
            u32::from(defaults.power_level.value()),
        ));

        let raw_mode = read(&keys.mode, defaults.mode.as_wire());
        let mode = Mode::try_from(raw_mode).unwrap_or_else(|_| {
            tracing::warn!(key = %keys.mode, value = raw_mode, "Invalid persisted mode");
            defaults.mode
        });

        let state = Self::new(output_enabled, power_level, mode);
        tracing::info!(?state, "Loaded device state");
        state
    }

    /// Writes all three fields to `store`.
    ///
    /// # Errors
    ///
    /// Returns the first `StoreError`; fields written before it stay written.
    pub fn save<S: PersistentStateStore + ?Sized>(
        &self,
        store: &mut S,
        keys: &StateKeys,
    ) -> Result<(), StoreError> {
        store.put(&keys.output, u32::from(self.output_enabled))?;
        store.put(&keys.power_level, u32::from(self.power_level.value()))?;
        store.put(&keys.mode, self.mode.as_wire())?;
        Ok(())
    }
}
