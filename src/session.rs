// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection lifecycle and the authentication gate.
//!
//! The [`SessionController`] is a synchronous state machine. Transport
//! callbacks are fed to [`handle_event`](SessionController::handle_event)
//! as [`LinkEvent`]s and the host calls [`tick`](SessionController::tick)
//! on a fixed cadence. Both take the current instant explicitly, so the
//! timeout and blink logic never read a clock of their own.
//!
//! ```text
//! Disconnected --connect--> Connected(unauthenticated) --secret--> Connected(authenticated)
//!      ^                          |          ^                           |
//!      |                          | timeout  +--------wrong secret-------+
//!      +------disconnect----------+-----------------disconnect-----------+
//! ```
//!
//! # Outbound Queue
//!
//! Replies leave in the order they were produced. Each queued message is
//! tagged with the [`SessionId`] that produced it and a due instant; a
//! disconnect clears the queue, and flushing drops anything tagged with a
//! session other than the live one.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::command::CommandCodec;
use crate::config::ServiceConfig;
use crate::dispatch::{CommandDispatcher, Outbound};
use crate::error::SessionError;
use crate::event::{EventBus, SessionEvent, SessionId};
use crate::port::{Actuator, PeerLink, PersistentStateStore};
use crate::state::DeviceState;

/// An inbound transport callback.
#[derive(Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A peer connected.
    Connected,
    /// The peer disconnected, or the transport finished dropping it.
    Disconnected,
    /// A write to the auth channel.
    AuthWrite(Vec<u8>),
    /// A write to the data channel.
    DataWrite(Vec<u8>),
}

impl std::fmt::Debug for LinkEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected => write!(f, "Disconnected"),
            // Auth payloads may hold the secret.
            Self::AuthWrite(bytes) => write!(f, "AuthWrite(<{} bytes>)", bytes.len()),
            Self::DataWrite(bytes) => f
                .debug_tuple("DataWrite")
                .field(&String::from_utf8_lossy(bytes))
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Connection {
    session: SessionId,
    authenticated: bool,
    auth_deadline: Instant,
}

#[derive(Debug)]
struct Pending {
    session: SessionId,
    due: Instant,
    payload: Vec<u8>,
}

/// The per-connection state machine.
///
/// Owns the [`CommandDispatcher`] (and through it the device state, store and
/// actuator) and the [`PeerLink`].
///
/// # Examples
///
/// ```
/// use std::time::Instant;
/// use ledlink::config::ServiceConfig;
/// use ledlink::error::LinkError;
/// use ledlink::port::{Actuator, MemoryStore, PeerLink};
/// use ledlink::session::{LinkEvent, SessionController};
/// use ledlink::types::PowerLevel;
///
/// #[derive(Default)]
/// struct Led(u8);
/// impl Actuator for Led {
///     fn set_digital_output(&mut self, active: bool) { self.0 = u8::from(active); }
///     fn set_pwm_level(&mut self, level: PowerLevel) { self.0 = level.value(); }
/// }
///
/// #[derive(Default)]
/// struct Sent(Vec<Vec<u8>>);
/// impl PeerLink for Sent {
///     fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
///         self.0.push(payload.to_vec());
///         Ok(())
///     }
///     fn disconnect_peer(&mut self) {}
///     fn start_advertising(&mut self) {}
/// }
///
/// let config = ServiceConfig::new("secret");
/// let mut session =
///     SessionController::new(&config, MemoryStore::new(), Led::default(), Sent::default());
///
/// let now = Instant::now();
/// session.handle_event(LinkEvent::Connected, now).unwrap();
/// session.handle_event(LinkEvent::AuthWrite(b"secret".to_vec()), now).unwrap();
/// session.handle_event(LinkEvent::DataWrite(b"1001".to_vec()), now).unwrap();
///
/// assert_eq!(session.actuator().0, 255);
/// assert_eq!(session.link().0, vec![b"01001".to_vec()]);
/// ```
#[derive(Debug)]
pub struct SessionController<S, A, L> {
    secret: Vec<u8>,
    auth_timeout: Duration,
    codec: CommandCodec,
    connection: Option<Connection>,
    queue: VecDeque<Pending>,
    dispatcher: CommandDispatcher<S, A>,
    link: L,
    events: EventBus,
}

impl<S, A, L> SessionController<S, A, L>
where
    S: PersistentStateStore,
    A: Actuator,
    L: PeerLink,
{
    /// Creates a disconnected controller and loads the device state.
    ///
    /// Neither the actuator nor the link is touched; call
    /// [`restore`](Self::restore) once at boot.
    #[must_use]
    pub fn new(config: &ServiceConfig, store: S, actuator: A, link: L) -> Self {
        let events = EventBus::new();
        Self {
            secret: config.shared_secret.as_bytes().to_vec(),
            auth_timeout: config.auth_timeout(),
            codec: config.codec(),
            connection: None,
            queue: VecDeque::new(),
            dispatcher: CommandDispatcher::new(config, store, actuator, events.clone()),
            link,
            events,
        }
    }

    /// Applies the loaded device state to the actuator and starts
    /// advertising.
    pub fn restore(&mut self, now: Instant) {
        self.dispatcher.restore(now);
        self.link.start_advertising();
        tracing::info!(state = ?self.dispatcher.state(), "Peripheral ready");
    }

    /// Processes one transport callback.
    ///
    /// Due replies are sent before returning.
    ///
    /// # Errors
    ///
    /// Returns the [`SessionError`] describing a rejected event. The event
    /// has already been logged and dropped; the error is informational and
    /// the controller stays usable.
    pub fn handle_event(&mut self, event: LinkEvent, now: Instant) -> Result<(), SessionError> {
        match event {
            LinkEvent::Connected => {
                self.on_connect(now);
                Ok(())
            }
            LinkEvent::Disconnected => {
                self.on_disconnect();
                Ok(())
            }
            LinkEvent::AuthWrite(bytes) => self.on_auth(&bytes),
            LinkEvent::DataWrite(bytes) => {
                let result = self.on_data(&bytes, now);
                self.flush(now);
                result
            }
        }
    }

    /// Runs one iteration of the poll loop: the auth timeout check, the
    /// blink toggle and the outbound flush.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AuthTimeout`] when this tick dropped the
    /// peer. Later ticks return `Ok`.
    pub fn tick(&mut self, now: Instant) -> Result<(), SessionError> {
        let timed_out = self
            .connection
            .filter(|c| !c.authenticated && now >= c.auth_deadline);

        if let Some(connection) = timed_out {
            tracing::warn!(session = %connection.session, "Authentication timed out");
            self.events.publish(SessionEvent::TimedOut {
                session: connection.session,
            });
            self.end_session(true);
            self.link.disconnect_peer();
        }

        self.dispatcher.tick(now);
        self.flush(now);

        match timed_out {
            Some(_) => Err(SessionError::AuthTimeout),
            None => Ok(()),
        }
    }

    /// Returns `true` while a peer is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Returns `true` while the connected peer is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.connection.is_some_and(|c| c.authenticated)
    }

    /// Returns the id of the live session.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.connection.map(|c| c.session)
    }

    /// Returns the instant at which an unauthenticated peer is dropped.
    #[must_use]
    pub fn auth_deadline(&self) -> Option<Instant> {
        self.connection
            .filter(|c| !c.authenticated)
            .map(|c| c.auth_deadline)
    }

    /// Returns the number of replies waiting for their due instant.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns the current device state.
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        self.dispatcher.state()
    }

    /// Returns the state store.
    #[must_use]
    pub fn store(&self) -> &S {
        self.dispatcher.store()
    }

    /// Returns the actuator.
    #[must_use]
    pub fn actuator(&self) -> &A {
        self.dispatcher.output().actuator()
    }

    /// Returns the peer link.
    #[must_use]
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribes to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn on_connect(&mut self, now: Instant) {
        if let Some(previous) = self.connection {
            tracing::warn!(session = %previous.session, "Connect while connected, replacing session");
            self.end_session(true);
        }

        let session = SessionId::new();
        self.connection = Some(Connection {
            session,
            authenticated: false,
            auth_deadline: now + self.auth_timeout,
        });
        tracing::info!(%session, timeout = ?self.auth_timeout, "Peer connected");
        self.events.publish(SessionEvent::Connected { session });
    }

    fn on_disconnect(&mut self) {
        if self.connection.is_some() {
            self.end_session(false);
        } else {
            tracing::debug!("Disconnect with no live session");
        }
        self.dispatcher.force_safe();
        self.link.start_advertising();
    }

    fn on_auth(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let Some(connection) = self.connection.as_mut() else {
            tracing::warn!(len = bytes.len(), "Auth write without a connection");
            return Err(SessionError::NotConnected);
        };

        if bytes.is_empty() {
            tracing::debug!(session = %connection.session, "Ignoring empty auth write");
            return Ok(());
        }

        let session = connection.session;
        connection.authenticated = bytes == self.secret.as_slice();
        if connection.authenticated {
            tracing::info!(%session, "Peer authenticated");
            self.events.publish(SessionEvent::Authenticated { session });
            Ok(())
        } else {
            tracing::warn!(%session, len = bytes.len(), "Authentication failed");
            self.events.publish(SessionEvent::AuthFailed { session });
            Err(SessionError::AuthFailure)
        }
    }

    fn on_data(&mut self, bytes: &[u8], now: Instant) -> Result<(), SessionError> {
        let Some(connection) = self.connection else {
            tracing::warn!(len = bytes.len(), "Data write without a connection");
            return Err(SessionError::NotConnected);
        };
        if !connection.authenticated {
            tracing::warn!(session = %connection.session, len = bytes.len(), "Unauthorized command dropped");
            return Err(SessionError::UnauthorizedCommand);
        }

        let command = self.codec.decode(bytes).map_err(|e| {
            tracing::debug!(session = %connection.session, error = %e, "Dropping malformed payload");
            e
        })?;

        let replies = self.dispatcher.dispatch(command, now);
        self.enqueue(connection.session, replies, now);
        Ok(())
    }

    fn enqueue(&mut self, session: SessionId, replies: Vec<Outbound>, now: Instant) {
        for reply in replies {
            let mut due = now + reply.delay;
            if let Some(last) = self.queue.back() {
                due = due.max(last.due);
            }
            self.queue.push_back(Pending {
                session,
                due,
                payload: reply.payload,
            });
        }
    }

    fn flush(&mut self, now: Instant) {
        let live = self.session_id();
        while self.queue.front().is_some_and(|p| p.due <= now) {
            let Some(pending) = self.queue.pop_front() else {
                break;
            };
            if Some(pending.session) != live {
                tracing::debug!(session = %pending.session, "Dropping reply of an ended session");
                continue;
            }
            match self.link.send(&pending.payload) {
                Ok(()) => tracing::debug!(
                    payload = %String::from_utf8_lossy(&pending.payload),
                    "Sent reply"
                ),
                Err(e) => tracing::warn!(error = %e, "Failed to send reply"),
            }
        }
    }

    fn end_session(&mut self, forced: bool) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        let dropped = self.queue.len();
        self.queue.clear();
        tracing::info!(session = %connection.session, forced, dropped, "Peer disconnected");
        self.events.publish(SessionEvent::Disconnected {
            session: connection.session,
            forced,
        });
    }
}
