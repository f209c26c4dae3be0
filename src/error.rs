// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `ledlink` engine.
//!
//! Every error in this crate is locally recoverable: the session controller
//! reports them to its host for logging, but none of them stop the control
//! loop.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A value is outside its valid range.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A wire payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A command could not be encoded with the configured wire format.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// A session-level rejection (auth failure, unauthorized command, ...).
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The persistent state store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The peer link failed.
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// The service configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u32,
        /// Maximum allowed value.
        max: u32,
        /// The actual value that was provided.
        actual: u32,
    },
}

/// Errors raised while decoding an inbound wire payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload is empty, contains a non-digit byte, or does not fit an
    /// unsigned integer.
    #[error("malformed payload ({len} bytes)")]
    Malformed {
        /// Length of the rejected payload.
        len: usize,
    },
}

/// Errors raised while encoding an outbound message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The value does not fit the configured value width.
    #[error("value {value} does not fit {width} digit(s)")]
    ValueOutOfRange {
        /// The value that was rejected.
        value: u32,
        /// Configured value width in digits.
        width: u32,
    },

    /// The selector does not fit the configured (padded) selector width.
    #[error("selector {selector} does not fit {width} digit(s)")]
    SelectorOutOfRange {
        /// The selector that was rejected.
        selector: u32,
        /// Configured selector width in digits.
        width: usize,
    },
}

/// Rejections reported by the session controller.
///
/// None of these are surfaced to the peer: the protocol has no error-reply
/// channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The auth payload did not match the shared secret.
    #[error("authentication failed")]
    AuthFailure,

    /// A data write arrived before the session authenticated.
    #[error("unauthorized command")]
    UnauthorizedCommand,

    /// The peer did not authenticate before the deadline and was dropped.
    #[error("authentication timed out")]
    AuthTimeout,

    /// An auth or data write arrived with no connected peer.
    #[error("no peer connected")]
    NotConnected,

    /// A data write could not be decoded and was dropped.
    #[error("dropped payload: {0}")]
    Malformed(#[from] DecodeError),
}

/// Errors raised by a [`PersistentStateStore`](crate::port::PersistentStateStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a valid key/value document.
    #[error("store contents invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// The store is not available right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by a [`PeerLink`](crate::port::PeerLink).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// A notification could not be delivered to the peer.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The link has no connected peer.
    #[error("peer not connected")]
    NotConnected,
}

/// Errors found while validating a [`ServiceConfig`](crate::config::ServiceConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The shared secret is empty.
    #[error("shared secret must not be empty")]
    EmptySecret,

    /// The value width is outside the supported range.
    #[error("value width {0} is out of range [1, 9]")]
    ValueWidth(u32),

    /// Two targets use the same selector.
    #[error("selector {0} is assigned to more than one target")]
    DuplicateSelector(u32),

    /// A selector does not fit the padded selector width.
    #[error("selector {selector} does not fit {width} digit(s)")]
    SelectorTooWide {
        /// The offending selector.
        selector: u32,
        /// Configured selector width.
        width: usize,
    },

    /// A master code does not fit the value width.
    #[error("master code {code} does not fit {width} digit(s)")]
    MasterCodeTooWide {
        /// The offending code.
        code: u32,
        /// Configured value width.
        width: u32,
    },

    /// The first-boot power level does not fit the value width.
    #[error("default power level {level} does not fit {width} digit(s)")]
    DefaultPowerLevelTooWide {
        /// The configured default level.
        level: u8,
        /// Configured value width.
        width: u32,
    },

    /// Save and resync share a master code.
    #[error("save and resync must use distinct master codes")]
    AmbiguousMasterCodes,

    /// A timing field is zero.
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON.
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
