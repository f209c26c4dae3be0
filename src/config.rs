// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service configuration.
//!
//! Every protocol constant that differs between deployments lives here:
//! digit widths, selectors, master codes, store keys and timings.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::{CommandCodec, MasterCodes, Selectors, WireFormat};
use crate::error::ConfigError;
use crate::state::{DeviceState, StateKeys};
use crate::types::{Mode, OutputVariant, PowerLevel};

/// Default authentication window after connect.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_millis(2000);

/// Configuration for one peripheral.
///
/// Fields missing from a JSON document take their defaults.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ledlink::config::ServiceConfig;
///
/// let config = ServiceConfig::new("hunter2")
///     .with_auth_timeout(Duration::from_secs(5))
///     .with_broadcast_pacing(Duration::from_millis(30));
/// assert!(config.validate().is_ok());
///
/// let parsed = ServiceConfig::from_json_str(r#"{ "shared_secret": "hunter2" }"#).unwrap();
/// assert_eq!(parsed.auth_timeout(), Duration::from_millis(2000));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Byte string the peer must write to the auth channel.
    pub shared_secret: String,
    /// Authentication window in milliseconds.
    pub auth_timeout_ms: u64,
    /// Host poll loop cadence in milliseconds.
    pub poll_interval_ms: u64,
    /// Blink half-period in milliseconds.
    pub blink_period_ms: u64,
    /// Delay between successive broadcast messages in milliseconds.
    pub broadcast_pacing_ms: u64,
    /// Which actuator method the deployment uses.
    pub output: OutputVariant,
    /// Digit widths of the wire format.
    pub wire: WireFormat,
    /// Target selector numbering.
    pub selectors: Selectors,
    /// Reserved master values.
    pub master_codes: MasterCodes,
    /// Store keys of the persisted fields.
    pub keys: StateKeys,
    /// First-boot device state.
    pub defaults: DeviceState,
}

impl ServiceConfig {
    /// Creates a configuration with the wide wire format and default timings.
    #[must_use]
    pub fn new(shared_secret: impl Into<String>) -> Self {
        Self {
            shared_secret: shared_secret.into(),
            ..Self::default()
        }
    }

    /// Creates a configuration for the single-digit protocol of on/off
    /// deployments.
    #[must_use]
    pub fn compact(shared_secret: impl Into<String>) -> Self {
        Self {
            shared_secret: shared_secret.into(),
            output: OutputVariant::Digital,
            wire: WireFormat::compact(),
            selectors: Selectors::compact(),
            master_codes: MasterCodes::compact(),
            defaults: DeviceState::new(false, PowerLevel::from(9), Mode::Static),
            ..Self::default()
        }
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the document is invalid, or the first
    /// validation error.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "Read configuration");
        Self::from_json_str(&json)
    }

    /// Sets the shared secret.
    #[must_use]
    pub fn with_shared_secret(mut self, secret: impl Into<String>) -> Self {
        self.shared_secret = secret.into();
        self
    }

    /// Sets the authentication window.
    #[must_use]
    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout_ms = millis(timeout);
        self
    }

    /// Sets the poll loop cadence.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = millis(interval);
        self
    }

    /// Sets the blink half-period.
    #[must_use]
    pub fn with_blink_period(mut self, period: Duration) -> Self {
        self.blink_period_ms = millis(period);
        self
    }

    /// Sets the delay between broadcast messages.
    #[must_use]
    pub fn with_broadcast_pacing(mut self, pacing: Duration) -> Self {
        self.broadcast_pacing_ms = millis(pacing);
        self
    }

    /// Sets the output variant.
    #[must_use]
    pub fn with_output(mut self, output: OutputVariant) -> Self {
        self.output = output;
        self
    }

    /// Sets the wire format.
    #[must_use]
    pub fn with_wire_format(mut self, wire: WireFormat) -> Self {
        self.wire = wire;
        self
    }

    /// Sets the selector numbering.
    #[must_use]
    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Sets the master codes.
    #[must_use]
    pub fn with_master_codes(mut self, codes: MasterCodes) -> Self {
        self.master_codes = codes;
        self
    }

    /// Sets the store keys.
    #[must_use]
    pub fn with_keys(mut self, keys: StateKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Sets the first-boot state.
    #[must_use]
    pub fn with_defaults(mut self, defaults: DeviceState) -> Self {
        self.defaults = defaults;
        self
    }

    /// Returns the authentication window.
    #[must_use]
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }

    /// Returns the poll loop cadence.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the blink half-period.
    #[must_use]
    pub fn blink_period(&self) -> Duration {
        Duration::from_millis(self.blink_period_ms)
    }

    /// Returns the delay between broadcast messages.
    #[must_use]
    pub fn broadcast_pacing(&self) -> Duration {
        Duration::from_millis(self.broadcast_pacing_ms)
    }

    /// Returns a codec for the configured wire format and selectors.
    #[must_use]
    pub fn codec(&self) -> CommandCodec {
        CommandCodec::new(self.wire, self.selectors)
    }

    /// Returns the highest power level the value field can carry.
    ///
    /// Levels are clamped to this so every state field stays encodable.
    #[must_use]
    pub fn power_level_ceiling(&self) -> PowerLevel {
        PowerLevel::clamped(u32::try_from(self.wire.max_value()).unwrap_or(u32::MAX))
    }

    /// Checks the configuration for inconsistencies.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shared_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if !(1..=9).contains(&self.wire.value_width) {
            return Err(ConfigError::ValueWidth(self.wire.value_width));
        }

        let mut seen = HashSet::new();
        for selector in self.selectors.all() {
            if !seen.insert(selector) {
                return Err(ConfigError::DuplicateSelector(selector));
            }
            if !self.wire.selector_fits(selector) {
                return Err(ConfigError::SelectorTooWide {
                    selector,
                    width: self.wire.selector_width,
                });
            }
        }

        let codes = self.master_codes;
        for code in [codes.save, codes.resync, codes.resync_complete, codes.save_ack] {
            if u64::from(code) > self.wire.max_value() {
                return Err(ConfigError::MasterCodeTooWide {
                    code,
                    width: self.wire.value_width,
                });
            }
        }
        if codes.save == codes.resync {
            return Err(ConfigError::AmbiguousMasterCodes);
        }

        let level = self.defaults.power_level();
        if level > self.power_level_ceiling() {
            return Err(ConfigError::DefaultPowerLevelTooWide {
                level: level.value(),
                width: self.wire.value_width,
            });
        }

        for (name, value) in [
            ("auth_timeout_ms", self.auth_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("blink_period_ms", self.blink_period_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval(name));
            }
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            shared_secret: String::new(),
            auth_timeout_ms: millis(DEFAULT_AUTH_TIMEOUT),
            poll_interval_ms: 50,
            blink_period_ms: 500,
            broadcast_pacing_ms: 20,
            output: OutputVariant::default(),
            wire: WireFormat::default(),
            selectors: Selectors::default(),
            master_codes: MasterCodes::default(),
            keys: StateKeys::default(),
            defaults: DeviceState::default(),
        }
    }
}

// Hand-written so the secret never reaches a log line.
impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("shared_secret", &format_args!("<{} bytes>", self.shared_secret.len()))
            .field("auth_timeout_ms", &self.auth_timeout_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("blink_period_ms", &self.blink_period_ms)
            .field("broadcast_pacing_ms", &self.broadcast_pacing_ms)
            .field("output", &self.output)
            .field("wire", &self.wire)
            .field("selectors", &self.selectors)
            .field("master_codes", &self.master_codes)
            .field("keys", &self.keys)
            .field("defaults", &self.defaults)
            .finish()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = ServiceConfig::new("s");
        assert_eq!(config.auth_timeout(), Duration::from_millis(2000));
        assert_eq!(config.wire, WireFormat::wide());
        assert_eq!(config.selectors.master, 99);
        assert_eq!(config.master_codes.resync_complete, 999);
        assert_eq!(config.keys.output, "ledState");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn compact_preset_is_valid() {
        let config = ServiceConfig::compact("s");
        assert_eq!(config.output, OutputVariant::Digital);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            ServiceConfig::default().validate(),
            Err(ConfigError::EmptySecret)
        ));
    }

    #[test]
    fn value_width_out_of_range_is_rejected() {
        let config = ServiceConfig::new("s").with_wire_format(WireFormat {
            selector_width: 2,
            value_width: 0,
        });
        assert!(matches!(config.validate(), Err(ConfigError::ValueWidth(0))));
    }

    #[test]
    fn duplicate_selector_is_rejected() {
        let config = ServiceConfig::new("s").with_selectors(Selectors {
            output: 1,
            power_level: 1,
            mode: 3,
            master: 99,
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateSelector(1))
        ));
    }

    #[test]
    fn selector_wider_than_padding_is_rejected() {
        let config = ServiceConfig::new("s").with_selectors(Selectors {
            master: 100,
            ..Selectors::default()
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SelectorTooWide {
                selector: 100,
                width: 2
            })
        ));
    }

    #[test]
    fn master_code_wider_than_value_is_rejected() {
        // Wide codes with the compact format: 999 does not fit one digit.
        let config = ServiceConfig::new("s").with_wire_format(WireFormat::compact());
        let err = config
            .with_selectors(Selectors::compact())
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MasterCodeTooWide { code: 999, width: 1 }
        ));
    }

    #[test]
    fn ambiguous_master_codes_are_rejected() {
        let config = ServiceConfig::new("s").with_master_codes(MasterCodes {
            save: 2,
            ..MasterCodes::default()
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AmbiguousMasterCodes)
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = ServiceConfig::new("s").with_poll_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval("poll_interval_ms"))
        ));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ServiceConfig::from_json_str(
            r#"{
                "shared_secret": "abc",
                "output": "digital",
                "wire": { "value_width": 1, "selector_width": 0 },
                "selectors": { "master": 9 },
                "master_codes": { "resync_complete": 9 },
                "defaults": { "power_level": 9 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.output, OutputVariant::Digital);
        assert_eq!(config.wire, WireFormat::compact());
        assert_eq!(config.selectors, Selectors::compact());
        assert_eq!(config.master_codes, MasterCodes::compact());
        assert_eq!(config.blink_period_ms, 500);
    }

    #[test]
    fn default_power_level_wider_than_value_is_rejected() {
        let err = ServiceConfig::from_json_str(
            r#"{
                "shared_secret": "abc",
                "wire": { "value_width": 1, "selector_width": 0 },
                "selectors": { "master": 9 },
                "master_codes": { "resync_complete": 9 }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DefaultPowerLevelTooWide {
                level: 255,
                width: 1
            }
        ));
    }

    #[test]
    fn power_level_ceiling_follows_value_width() {
        assert_eq!(ServiceConfig::new("s").power_level_ceiling(), PowerLevel::MAX);
        assert_eq!(
            ServiceConfig::compact("s").power_level_ceiling(),
            PowerLevel::from(9)
        );
        let two_digits = ServiceConfig::new("s").with_wire_format(WireFormat {
            selector_width: 2,
            value_width: 2,
        });
        assert_eq!(two_digits.power_level_ceiling(), PowerLevel::from(99));
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(
            ServiceConfig::from_json_str("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = ServiceConfig::compact("xyz").with_blink_period(Duration::from_millis(250));
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        assert_eq!(ServiceConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", ServiceConfig::new("topsecret"));
        assert!(!rendered.contains("topsecret"));
        assert!(rendered.contains("<9 bytes>"));
    }
}
