// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for output control.
//!
//! Each type ensures values are within their valid ranges at construction
//! time.
//!
//! # Types
//!
//! - [`PowerLevel`] - PWM duty target (0-255)
//! - [`Mode`] - Static or blinking output
//! - [`OutputVariant`] - Whether the deployment drives a digital pin or a PWM channel

mod mode;
mod power_level;

pub use mode::Mode;
pub use power_level::PowerLevel;

/// Which actuator capability a deployment exercises.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OutputVariant {
    /// Pure on/off output; the power level is ignored.
    Digital,
    /// Variable intensity output driven by the power level.
    #[default]
    Pwm,
}
