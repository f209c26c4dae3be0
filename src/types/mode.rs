// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output mode type.

use std::fmt;

use crate::error::ValueError;

/// How an enabled output is driven.
///
/// | Value | Mode | Behavior |
/// |-------|------|----------|
/// | 0 | Static | Held at the active level |
/// | 1 | Blinking | Toggled on a fixed period |
///
/// # Examples
///
/// ```
/// use ledlink::types::Mode;
///
/// assert_eq!(Mode::try_from(1).unwrap(), Mode::Blinking);
/// assert_eq!(Mode::Static.as_wire(), 0);
/// assert!(Mode::try_from(2).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Held steady while enabled.
    #[default]
    Static,
    /// Periodically toggled while enabled.
    Blinking,
}

impl Mode {
    /// Returns the numeric value used on the wire and in the store.
    #[must_use]
    pub const fn as_wire(&self) -> u32 {
        match self {
            Self::Static => 0,
            Self::Blinking => 1,
        }
    }

    /// Returns the mode name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Static => "Static",
            Self::Blinking => "Blinking",
        }
    }
}

impl TryFrom<u32> for Mode {
    type Error = ValueError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Static),
            1 => Ok(Self::Blinking),
            _ => Err(ValueError::OutOfRange {
                min: 0,
                max: 1,
                actual: value,
            }),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_wire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_wire_values() {
        assert_eq!(Mode::Static.as_wire(), 0);
        assert_eq!(Mode::Blinking.as_wire(), 1);
    }

    #[test]
    fn mode_try_from() {
        assert_eq!(Mode::try_from(0).unwrap(), Mode::Static);
        assert_eq!(Mode::try_from(1).unwrap(), Mode::Blinking);
        assert!(Mode::try_from(7).is_err());
    }

    #[test]
    fn mode_default() {
        assert_eq!(Mode::default(), Mode::Static);
    }

    #[test]
    fn mode_display() {
        assert_eq!(Mode::Blinking.to_string(), "Blinking (1)");
    }
}
