// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power level type for PWM outputs.
//!
//! This module provides a type-safe representation of the PWM duty target,
//! ensuring values are always within the valid range of 0-255.

use std::fmt;

use crate::error::ValueError;

/// PWM duty target (0-255).
///
/// Pure on/off outputs ignore the level; PWM outputs drive it as the duty
/// cycle while the output is enabled.
///
/// # Examples
///
/// ```
/// use ledlink::types::PowerLevel;
///
/// let level = PowerLevel::new(128).unwrap();
/// assert_eq!(level.value(), 128);
///
/// // Wire values wider than a byte clamp to the maximum
/// assert_eq!(PowerLevel::clamped(999), PowerLevel::MAX);
///
/// assert!(PowerLevel::new(256).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PowerLevel(u8);

impl PowerLevel {
    /// Lowest level (duty 0).
    pub const MIN: Self = Self(0);

    /// Highest level (full duty).
    pub const MAX: Self = Self(u8::MAX);

    /// Creates a power level.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 255.
    pub fn new(value: u32) -> Result<Self, ValueError> {
        u8::try_from(value)
            .map(Self)
            .map_err(|_| ValueError::OutOfRange {
                min: 0,
                max: u32::from(u8::MAX),
                actual: value,
            })
    }

    /// Creates a power level, clamping to the valid range.
    #[must_use]
    pub fn clamped(value: u32) -> Self {
        Self(u8::try_from(value).unwrap_or(u8::MAX))
    }

    /// Returns the raw duty value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns the level as a float between 0.0 and 1.0.
    #[must_use]
    pub fn as_fraction(&self) -> f32 {
        f32::from(self.0) / f32::from(u8::MAX)
    }
}

impl Default for PowerLevel {
    fn default() -> Self {
        Self::MAX
    }
}

impl From<u8> for PowerLevel {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl TryFrom<u32> for PowerLevel {
    type Error = ValueError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for PowerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/255", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_level_valid_values() {
        for v in [0, 1, 127, 254, 255] {
            assert_eq!(u32::from(PowerLevel::new(v).unwrap().value()), v);
        }
    }

    #[test]
    fn power_level_invalid_value() {
        let err = PowerLevel::new(256).unwrap_err();
        assert_eq!(
            err,
            ValueError::OutOfRange {
                min: 0,
                max: 255,
                actual: 256
            }
        );
    }

    #[test]
    fn power_level_clamped() {
        assert_eq!(PowerLevel::clamped(42).value(), 42);
        assert_eq!(PowerLevel::clamped(256).value(), 255);
        assert_eq!(PowerLevel::clamped(u32::MAX).value(), 255);
    }

    #[test]
    fn power_level_fraction() {
        assert!((PowerLevel::MIN.as_fraction() - 0.0).abs() < f32::EPSILON);
        assert!((PowerLevel::MAX.as_fraction() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn power_level_default_is_full() {
        assert_eq!(PowerLevel::default(), PowerLevel::MAX);
    }

    #[test]
    fn power_level_display() {
        assert_eq!(PowerLevel::from(64).to_string(), "64/255");
    }
}
