// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Threaded host runtime.
//!
//! On hosts where transport callbacks arrive on a different thread than the
//! poll loop, both go through a [`SharedSession`]: a single mutex around the
//! [`SessionController`]. [`Runtime::run`] is the poll loop; it consumes
//! [`LinkEvent`]s from a channel and ticks on the configured interval, so
//! the timeout check and the blink toggle run every iteration.
//!
//! The clock is tokio's, which lets tests drive it with a paused runtime.
//!
//! # Examples
//!
//! ```no_run
//! use ledlink::config::ServiceConfig;
//! use ledlink::error::LinkError;
//! use ledlink::port::{Actuator, MemoryStore, PeerLink};
//! use ledlink::runtime::Runtime;
//! use ledlink::session::LinkEvent;
//! use ledlink::types::PowerLevel;
//!
//! struct Pin;
//! impl Actuator for Pin {
//!     fn set_digital_output(&mut self, _active: bool) {}
//!     fn set_pwm_level(&mut self, _level: PowerLevel) {}
//! }
//!
//! struct Radio;
//! impl PeerLink for Radio {
//!     fn send(&mut self, _payload: &[u8]) -> Result<(), LinkError> { Ok(()) }
//!     fn disconnect_peer(&mut self) {}
//!     fn start_advertising(&mut self) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ledlink::error::ConfigError> {
//!     let runtime = Runtime::new(ServiceConfig::new("secret"), MemoryStore::new(), Pin, Radio)?;
//!     let (tx, rx) = tokio::sync::mpsc::channel(16);
//!
//!     tokio::spawn(runtime.run(rx));
//!     tx.send(LinkEvent::Connected).await.ok();
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::ServiceConfig;
use crate::error::{ConfigError, SessionError};
use crate::event::SessionEvent;
use crate::port::{Actuator, PeerLink, PersistentStateStore};
use crate::session::{LinkEvent, SessionController};

/// A [`SessionController`] shared between the transport and the poll loop.
#[derive(Debug)]
pub struct SharedSession<S, A, L> {
    inner: Arc<Mutex<SessionController<S, A, L>>>,
}

impl<S, A, L> Clone for SharedSession<S, A, L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A, L> SharedSession<S, A, L>
where
    S: PersistentStateStore,
    A: Actuator,
    L: PeerLink,
{
    /// Wraps a controller.
    #[must_use]
    pub fn new(controller: SessionController<S, A, L>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Processes a transport callback at the current instant.
    ///
    /// # Errors
    ///
    /// See [`SessionController::handle_event`].
    pub fn handle_event(&self, event: LinkEvent) -> Result<(), SessionError> {
        let now = Instant::now().into_std();
        self.inner.lock().handle_event(event, now)
    }

    /// Runs one poll iteration at the current instant.
    ///
    /// # Errors
    ///
    /// See [`SessionController::tick`].
    pub fn tick(&self) -> Result<(), SessionError> {
        let now = Instant::now().into_std();
        self.inner.lock().tick(now)
    }

    /// Runs `f` with the controller locked.
    pub fn with<R>(&self, f: impl FnOnce(&SessionController<S, A, L>) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Subscribes to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.lock().subscribe()
    }
}

/// The host poll loop.
#[derive(Debug)]
pub struct Runtime<S, A, L> {
    session: SharedSession<S, A, L>,
    poll_interval: Duration,
}

impl<S, A, L> Runtime<S, A, L>
where
    S: PersistentStateStore,
    A: Actuator,
    L: PeerLink,
{
    /// Validates `config`, builds the controller and restores the persisted
    /// state to the actuator.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is inconsistent.
    pub fn new(config: ServiceConfig, store: S, actuator: A, link: L) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut controller = SessionController::new(&config, store, actuator, link);
        controller.restore(Instant::now().into_std());
        Ok(Self {
            session: SharedSession::new(controller),
            poll_interval: config.poll_interval(),
        })
    }

    /// Returns a handle for transport callbacks and inspection.
    #[must_use]
    pub fn session(&self) -> SharedSession<S, A, L> {
        self.session.clone()
    }

    /// Processes events and ticks until the event channel closes.
    ///
    /// Rejected events are already logged by the controller; the loop never
    /// stops on them.
    pub async fn run(self, mut events: mpsc::Receiver<LinkEvent>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(interval = ?self.poll_interval, "Starting poll loop");
        loop {
            tokio::select! {
                biased;

                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::info!("Event channel closed, stopping poll loop");
                        break;
                    };
                    report(self.session.handle_event(event));
                }
                _ = interval.tick() => report(self.session.tick()),
            }
        }
    }
}

fn report(result: Result<(), SessionError>) {
    if let Err(e) = result {
        tracing::debug!(error = %e, "Event rejected");
    }
}
