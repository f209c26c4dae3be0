// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session event types.

use crate::state::DeviceState;

use super::SessionId;

/// Events emitted by the engine.
///
/// Lifecycle events carry the id of the session they belong to; state
/// events carry the full device state after the change.
///
/// # Examples
///
/// ```
/// use ledlink::event::{SessionEvent, SessionId};
///
/// let session = SessionId::new();
/// let event = SessionEvent::Connected { session };
/// assert_eq!(event.session_id(), Some(session));
/// assert!(event.is_lifecycle());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A peer connected.
    Connected {
        /// The new session.
        session: SessionId,
    },

    /// The peer presented the shared secret.
    Authenticated {
        /// The authenticated session.
        session: SessionId,
    },

    /// The peer presented a wrong secret.
    AuthFailed {
        /// The session that failed.
        session: SessionId,
    },

    /// The peer did not authenticate in time and was dropped.
    TimedOut {
        /// The dropped session.
        session: SessionId,
    },

    /// The peer disconnected or was dropped.
    Disconnected {
        /// The ended session.
        session: SessionId,
        /// `true` if the engine dropped the peer.
        forced: bool,
    },

    /// A command changed the device state.
    StateChanged {
        /// The state after the change.
        state: DeviceState,
    },

    /// The device state was persisted.
    Saved {
        /// The persisted state.
        state: DeviceState,
    },
}

impl SessionEvent {
    /// Returns the session id, if the event belongs to a session.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            Self::Connected { session }
            | Self::Authenticated { session }
            | Self::AuthFailed { session }
            | Self::TimedOut { session }
            | Self::Disconnected { session, .. } => Some(*session),
            Self::StateChanged { .. } | Self::Saved { .. } => None,
        }
    }

    /// Returns `true` for connection and authentication events.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        self.session_id().is_some()
    }

    /// Returns `true` for state change and save events.
    #[must_use]
    pub fn is_state(&self) -> bool {
        matches!(self, Self::StateChanged { .. } | Self::Saved { .. })
    }
}
