// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ledlink` - session and command engine for a BLE-controlled output.
//!
//! A peripheral exposes a single output (a digital pin or a PWM channel,
//! optionally blinking) to one paired client. The client authenticates
//! with a shared secret, then sends fixed-width decimal commands; the
//! peripheral echoes every change and can restate its whole state on
//! request.
//!
//! The radio, the pin and the flash are behind the traits in [`port`], so
//! the engine runs unchanged on the device, on a host, and in tests.
//!
//! # Supported Features
//!
//! - **Authentication gate**: exact-match shared secret with a connect timeout
//! - **Command protocol**: configurable selector and value digit widths
//! - **Persistence**: explicit save of on/off, power level and mode
//! - **Resync**: paced broadcast of the device state to a reconnecting client
//! - **Blinking**: periodic toggling driven from the poll loop
//!
//! # Quick Start
//!
//! ```
//! use std::time::{Duration, Instant};
//! use ledlink::error::LinkError;
//! use ledlink::port::{Actuator, MemoryStore, PeerLink};
//! use ledlink::types::PowerLevel;
//! use ledlink::{LinkEvent, ServiceConfig, SessionController};
//!
//! struct Pin(u8);
//! impl Actuator for Pin {
//!     fn set_digital_output(&mut self, active: bool) { self.0 = u8::from(active); }
//!     fn set_pwm_level(&mut self, level: PowerLevel) { self.0 = level.value(); }
//! }
//!
//! struct Radio(Vec<String>);
//! impl PeerLink for Radio {
//!     fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
//!         self.0.push(String::from_utf8_lossy(payload).into_owned());
//!         Ok(())
//!     }
//!     fn disconnect_peer(&mut self) {}
//!     fn start_advertising(&mut self) {}
//! }
//!
//! let config = ServiceConfig::new("secret");
//! let mut session = SessionController::new(&config, MemoryStore::new(), Pin(0), Radio(Vec::new()));
//! let boot = Instant::now();
//! session.restore(boot);
//!
//! session.handle_event(LinkEvent::Connected, boot).unwrap();
//! session.handle_event(LinkEvent::AuthWrite(b"secret".to_vec()), boot).unwrap();
//! session.handle_event(LinkEvent::DataWrite(b"99002".to_vec()), boot).unwrap();
//! session.tick(boot + Duration::from_millis(100)).unwrap();
//!
//! assert_eq!(session.link().0, ["01000", "02255", "03000", "99999"]);
//! ```

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod gatt;
pub mod output;
pub mod port;
pub mod runtime;
pub mod session;
pub mod state;
pub mod types;

pub use command::{Command, CommandCodec, Target};
pub use config::ServiceConfig;
pub use error::{
    ConfigError, DecodeError, EncodeError, Error, LinkError, Result, SessionError, StoreError,
    ValueError,
};
pub use event::{EventBus, SessionEvent, SessionId};
pub use port::{Actuator, PeerLink, PersistentStateStore};
pub use runtime::{Runtime, SharedSession};
pub use session::{LinkEvent, SessionController};
pub use state::DeviceState;
pub use types::{Mode, OutputVariant, PowerLevel};
