// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-width decimal codec.

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};

use super::{Command, MasterAction, Target};

/// Digit layout of a wire message.
///
/// # Examples
///
/// ```
/// use ledlink::command::WireFormat;
///
/// let wide = WireFormat::wide();
/// assert_eq!(wide.selector_width, 2);
/// assert_eq!(wide.value_width, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireFormat {
    /// Digits the selector is zero-padded to on output; `0` leaves it unpadded.
    pub selector_width: usize,
    /// Digits of the trailing value field.
    pub value_width: u32,
}

impl WireFormat {
    /// Unpadded selector followed by one value digit.
    #[must_use]
    pub const fn compact() -> Self {
        Self {
            selector_width: 0,
            value_width: 1,
        }
    }

    /// Two-digit selector followed by three value digits.
    #[must_use]
    pub const fn wide() -> Self {
        Self {
            selector_width: 2,
            value_width: 3,
        }
    }

    /// Returns `10^value_width`, the divisor splitting selector from value.
    #[must_use]
    pub fn modulus(&self) -> u64 {
        10u64.pow(self.value_width)
    }

    /// Returns the largest value that fits the value field.
    #[must_use]
    pub fn max_value(&self) -> u64 {
        self.modulus() - 1
    }

    /// Returns `true` if `selector` fits the padded selector width.
    #[must_use]
    pub fn selector_fits(&self, selector: u32) -> bool {
        self.selector_width == 0
            || u32::try_from(self.selector_width)
                .ok()
                .and_then(|w| 10u64.checked_pow(w))
                .is_none_or(|limit| u64::from(selector) < limit)
    }
}

impl Default for WireFormat {
    fn default() -> Self {
        Self::wide()
    }
}

/// Selector numbers assigned to each target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Selector for [`Target::Output`].
    pub output: u32,
    /// Selector for [`Target::PowerLevel`].
    pub power_level: u32,
    /// Selector for [`Target::Mode`].
    pub mode: u32,
    /// Selector for [`Target::Master`].
    pub master: u32,
}

impl Selectors {
    /// Single-digit selectors for the compact format.
    #[must_use]
    pub const fn compact() -> Self {
        Self {
            output: 1,
            power_level: 2,
            mode: 3,
            master: 9,
        }
    }

    /// Maps a selector to its target.
    #[must_use]
    pub fn target(&self, selector: u32) -> Target {
        match selector {
            s if s == self.output => Target::Output,
            s if s == self.power_level => Target::PowerLevel,
            s if s == self.mode => Target::Mode,
            s if s == self.master => Target::Master,
            s => Target::Unknown(s),
        }
    }

    /// Maps a target to its selector.
    #[must_use]
    pub fn selector(&self, target: Target) -> u32 {
        match target {
            Target::Output => self.output,
            Target::PowerLevel => self.power_level,
            Target::Mode => self.mode,
            Target::Master => self.master,
            Target::Unknown(s) => s,
        }
    }

    /// Returns all assigned selectors.
    #[must_use]
    pub const fn all(&self) -> [u32; 4] {
        [self.output, self.power_level, self.mode, self.master]
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            output: 1,
            power_level: 2,
            mode: 3,
            master: 99,
        }
    }
}

/// Reserved values carried by `Master` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterCodes {
    /// Inbound: persist the device state.
    pub save: u32,
    /// Inbound: broadcast the device state.
    pub resync: u32,
    /// Outbound: terminal message of a broadcast.
    pub resync_complete: u32,
    /// Outbound: acknowledgement of a successful save.
    pub save_ack: u32,
}

impl MasterCodes {
    /// Single-digit codes for the compact format.
    #[must_use]
    pub const fn compact() -> Self {
        Self {
            save: 1,
            resync: 2,
            resync_complete: 9,
            save_ack: 1,
        }
    }

    /// Classifies an inbound master value.
    #[must_use]
    pub fn action(&self, value: u32) -> MasterAction {
        if value == self.save {
            MasterAction::Save
        } else if value == self.resync {
            MasterAction::Resync
        } else {
            MasterAction::Other(value)
        }
    }
}

impl Default for MasterCodes {
    fn default() -> Self {
        Self {
            save: 1,
            resync: 2,
            resync_complete: 999,
            save_ack: 1,
        }
    }
}

/// Encodes and decodes wire commands.
///
/// The same codec is used in both directions, so replies and broadcasts
/// decode with the peer's inbound decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandCodec {
    format: WireFormat,
    selectors: Selectors,
}

impl CommandCodec {
    /// Creates a codec for the given layout and selector numbering.
    #[must_use]
    pub const fn new(format: WireFormat, selectors: Selectors) -> Self {
        Self { format, selectors }
    }

    /// Returns the wire format.
    #[must_use]
    pub const fn format(&self) -> WireFormat {
        self.format
    }

    /// Returns the selector numbering.
    #[must_use]
    pub const fn selectors(&self) -> Selectors {
        self.selectors
    }

    /// Decodes an inbound payload.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::Malformed` if the payload is empty, contains
    /// anything but ASCII digits, or overflows.
    pub fn decode(&self, bytes: &[u8]) -> Result<Command, DecodeError> {
        let malformed = DecodeError::Malformed { len: bytes.len() };

        if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(malformed);
        }

        let text = std::str::from_utf8(bytes).map_err(|_| malformed.clone())?;
        let raw: u64 = text.parse().map_err(|_| malformed.clone())?;

        let modulus = self.format.modulus();
        let selector = u32::try_from(raw / modulus).map_err(|_| malformed.clone())?;
        let value = u32::try_from(raw % modulus).map_err(|_| malformed)?;

        Ok(Command::new(self.selectors.target(selector), value))
    }

    /// Encodes an outbound message.
    ///
    /// # Errors
    ///
    /// Returns an `EncodeError` if the value or selector does not fit the
    /// configured widths.
    pub fn encode(&self, target: Target, value: u32) -> Result<Vec<u8>, EncodeError> {
        if u64::from(value) > self.format.max_value() {
            return Err(EncodeError::ValueOutOfRange {
                value,
                width: self.format.value_width,
            });
        }

        let selector = self.selectors.selector(target);
        if !self.format.selector_fits(selector) {
            return Err(EncodeError::SelectorOutOfRange {
                selector,
                width: self.format.selector_width,
            });
        }

        let sw = self.format.selector_width;
        let vw = self.format.value_width as usize;
        Ok(format!("{selector:0sw$}{value:0vw$}").into_bytes())
    }
}
