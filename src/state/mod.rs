// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state and its persistence.
//!
//! [`DeviceState`] is the authoritative record of the controllable output.
//! It is loaded once at boot and written back only on an explicit save, so
//! the in-memory and persisted copies may differ in between.
//!
//! # Examples
//!
//! ```
//! use ledlink::port::MemoryStore;
//! use ledlink::state::{DeviceState, StateKeys};
//! use ledlink::types::{Mode, PowerLevel};
//!
//! let mut store = MemoryStore::new();
//! let keys = StateKeys::default();
//!
//! let mut state = DeviceState::load(&store, &keys, &DeviceState::default());
//! state.set_output_enabled(true);
//! state.set_power_level(PowerLevel::from(80));
//! state.set_mode(Mode::Blinking);
//! state.save(&mut store, &keys).unwrap();
//!
//! let reloaded = DeviceState::load(&store, &keys, &DeviceState::default());
//! assert_eq!(reloaded, state);
//! ```

mod device_state;

pub use device_state::{DeviceState, StateKeys};
