// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for session lifecycle and state changes.
//!
//! The engine publishes [`SessionEvent`]s on an [`EventBus`] backed by
//! tokio's broadcast channel. Hosts subscribe for status LEDs, metrics or
//! debugging; the wire protocol does not depend on it.
//!
//! # Examples
//!
//! ```
//! use ledlink::event::{EventBus, SessionEvent, SessionId};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! let session = SessionId::new();
//! bus.publish(SessionEvent::Connected { session });
//! assert_eq!(rx.try_recv().unwrap().session_id(), Some(session));
//! ```

mod event_bus;
mod session_event;
mod session_id;

pub use event_bus::EventBus;
pub use session_event::SessionEvent;
pub use session_id::SessionId;
