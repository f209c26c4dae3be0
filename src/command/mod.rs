// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire command definitions.
//!
//! A command is a `(target, value)` pair carried as a single ASCII decimal
//! string. The leading digits select the [`Target`], the trailing digits
//! (a fixed, configured width) carry the value.
//!
//! # Wire Format
//!
//! | Deployment | Selector | Value | `Output` on |
//! |------------|----------|-------|-------------|
//! | [`WireFormat::compact()`] | unpadded | 1 digit | `"11"` |
//! | [`WireFormat::wide()`] | 2 digits | 3 digits | `"01001"` |
//!
//! Decoding parses the whole payload as one unsigned integer, so leading
//! zeros are optional on input: `"1001"` and `"01001"` decode identically
//! under the wide format.
//!
//! # Examples
//!
//! ```
//! use ledlink::command::{Command, CommandCodec, Target};
//!
//! let codec = CommandCodec::default();
//!
//! let cmd = codec.decode(b"1001").unwrap();
//! assert_eq!(cmd, Command::new(Target::Output, 1));
//!
//! let reply = codec.encode(Target::Output, 1).unwrap();
//! assert_eq!(reply, b"01001");
//! ```

mod codec;

pub use codec::{CommandCodec, MasterCodes, Selectors, WireFormat};

use std::fmt;

/// The device-state field a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Output on/off.
    Output,
    /// PWM power level.
    PowerLevel,
    /// Static or blinking mode.
    Mode,
    /// Reserved instructions (save, resync).
    Master,
    /// A selector with no assigned target; dispatches to a no-op.
    Unknown(u32),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output => write!(f, "output"),
            Self::PowerLevel => write!(f, "power_level"),
            Self::Mode => write!(f, "mode"),
            Self::Master => write!(f, "master"),
            Self::Unknown(selector) => write!(f, "unknown({selector})"),
        }
    }
}

/// A decoded protocol message.
///
/// Commands are ephemeral: built by the codec, consumed by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// The addressed field.
    pub target: Target,
    /// The raw value digits.
    pub value: u32,
}

impl Command {
    /// Creates a command.
    #[must_use]
    pub const fn new(target: Target, value: u32) -> Self {
        Self { target, value }
    }
}

/// Interpretation of a `Master` command value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterAction {
    /// Persist the device state.
    Save,
    /// Restate the device state to the peer.
    Resync,
    /// Any other code; ignored.
    Other(u32),
}
