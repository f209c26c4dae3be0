// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command interpretation.
//!
//! The [`CommandDispatcher`] applies decoded commands to the device state
//! and the output, and produces the replies to send back. It owns the
//! device state: nothing else mutates it.
//!
//! # Replies
//!
//! | Command | Effect | Reply |
//! |---------|--------|-------|
//! | `Output` 0/1 | disable/enable | `(Output, value)` |
//! | `PowerLevel` n | level = min(n, ceiling) | `(PowerLevel, level)` |
//! | `Mode` 0/1 | static/blinking | `(Mode, value)` |
//! | `Master` save | persist state | `(Master, save_ack)` on success |
//! | `Master` resync | none | state broadcast |
//!
//! Anything else is a no-op without reply. The ceiling is 255, or less when
//! the value width cannot carry 255, so the level always fits a reply.
//!
//! # State Broadcast
//!
//! A resync restates every field using the inbound selectors, in the order
//! `Output`, `PowerLevel`, `Mode`, followed by `(Master, resync_complete)`.
//! Message *k* is due `k * pacing` after the request, which keeps the
//! stream within the peer's notification cadence.

use std::time::{Duration, Instant};

use crate::command::{Command, CommandCodec, MasterAction, MasterCodes, Target};
use crate::config::ServiceConfig;
use crate::event::{EventBus, SessionEvent};
use crate::output::OutputDriver;
use crate::port::{Actuator, PersistentStateStore};
use crate::state::{DeviceState, StateKeys};
use crate::types::{Mode, PowerLevel};

/// An encoded reply and how long after the triggering command it is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Encoded message.
    pub payload: Vec<u8>,
    /// Pacing delay relative to the command.
    pub delay: Duration,
}

impl Outbound {
    /// Creates a reply due immediately.
    #[must_use]
    pub fn immediate(payload: Vec<u8>) -> Self {
        Self {
            payload,
            delay: Duration::ZERO,
        }
    }
}

/// Applies commands to the device state and output.
#[derive(Debug)]
pub struct CommandDispatcher<S, A> {
    codec: CommandCodec,
    codes: MasterCodes,
    keys: StateKeys,
    pacing: Duration,
    ceiling: PowerLevel,
    state: DeviceState,
    store: S,
    output: OutputDriver<A>,
    events: EventBus,
}

impl<S, A> CommandDispatcher<S, A>
where
    S: PersistentStateStore,
    A: Actuator,
{
    /// Creates a dispatcher, loading the device state from `store`.
    ///
    /// The actuator is not touched until [`restore`](Self::restore) or the
    /// first command.
    #[must_use]
    pub fn new(config: &ServiceConfig, store: S, actuator: A, events: EventBus) -> Self {
        let ceiling = config.power_level_ceiling();
        let mut state = DeviceState::load(&store, &config.keys, &config.defaults);
        if state.power_level() > ceiling {
            tracing::warn!(
                level = state.power_level().value(),
                ceiling = ceiling.value(),
                "Clamping loaded power level to value width"
            );
            state.set_power_level(ceiling);
        }
        Self {
            codec: config.codec(),
            codes: config.master_codes,
            keys: config.keys.clone(),
            pacing: config.broadcast_pacing(),
            ceiling,
            state,
            store,
            output: OutputDriver::new(actuator, config.output, config.blink_period()),
            events,
        }
    }

    /// Returns the codec used for replies.
    #[must_use]
    pub fn codec(&self) -> &CommandCodec {
        &self.codec
    }

    /// Returns the current device state.
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Returns the state store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the output driver.
    #[must_use]
    pub fn output(&self) -> &OutputDriver<A> {
        &self.output
    }

    /// Applies the loaded state to the actuator.
    pub fn restore(&mut self, now: Instant) {
        self.output.apply(&self.state, now);
    }

    /// Drives the output to its safe state.
    pub fn force_safe(&mut self) {
        self.output.force_safe();
    }

    /// Advances the blink toggle.
    pub fn tick(&mut self, now: Instant) {
        self.output.tick(&self.state, now);
    }

    /// Interprets one command.
    ///
    /// Returns the replies to send, in order. Never blocks.
    pub fn dispatch(&mut self, command: Command, now: Instant) -> Vec<Outbound> {
        tracing::debug!(field = %command.target, value = command.value, "Dispatching command");

        match command.target {
            Target::Output => self.set_output(command.value, now),
            Target::PowerLevel => self.set_power_level(command.value, now),
            Target::Mode => self.set_mode(command.value, now),
            Target::Master => match self.codes.action(command.value) {
                MasterAction::Save => self.save(),
                MasterAction::Resync => self.broadcast(),
                MasterAction::Other(code) => {
                    tracing::debug!(code, "Ignoring unknown master code");
                    Vec::new()
                }
            },
            Target::Unknown(selector) => {
                tracing::debug!(selector, "Ignoring unknown selector");
                Vec::new()
            }
        }
    }

    /// Builds the paced restatement of the device state.
    #[must_use]
    pub fn broadcast(&self) -> Vec<Outbound> {
        let fields = [
            (Target::Output, u32::from(self.state.output_enabled())),
            (
                Target::PowerLevel,
                u32::from(self.state.power_level().value()),
            ),
            (Target::Mode, self.state.mode().as_wire()),
            (Target::Master, self.codes.resync_complete),
        ];

        let mut replies = Vec::with_capacity(fields.len());
        for (target, value) in fields {
            match self.codec.encode(target, value) {
                Ok(payload) => {
                    let slot = u32::try_from(replies.len()).unwrap_or(u32::MAX);
                    replies.push(Outbound {
                        payload,
                        delay: self.pacing.saturating_mul(slot),
                    });
                }
                Err(e) => {
                    tracing::warn!(field = %target, value, error = %e, "Skipping unencodable broadcast field");
                }
            }
        }
        tracing::info!(messages = replies.len(), "Broadcasting device state");
        replies
    }

    fn set_output(&mut self, value: u32, now: Instant) -> Vec<Outbound> {
        let enabled = match value {
            0 => false,
            1 => true,
            other => {
                tracing::debug!(value = other, "Ignoring output value");
                return Vec::new();
            }
        };
        self.update(now, |state| state.set_output_enabled(enabled));
        tracing::info!(enabled, "Output switched");
        self.echo(Target::Output, value)
    }

    fn set_power_level(&mut self, value: u32, now: Instant) -> Vec<Outbound> {
        let level = PowerLevel::clamped(value).min(self.ceiling);
        let enabled = self.state.output_enabled();
        self.state.set_power_level(level);
        if enabled {
            self.output.apply(&self.state, now);
        }
        self.publish_change();
        tracing::info!(level = level.value(), "Power level set");
        self.echo(Target::PowerLevel, u32::from(level.value()))
    }

    fn set_mode(&mut self, value: u32, now: Instant) -> Vec<Outbound> {
        let Ok(mode) = Mode::try_from(value) else {
            tracing::debug!(value, "Ignoring mode value");
            return Vec::new();
        };
        let enabled = self.state.output_enabled();
        self.state.set_mode(mode);
        if enabled {
            self.output.apply(&self.state, now);
        }
        self.publish_change();
        tracing::info!(mode = mode.name(), "Mode set");
        self.echo(Target::Mode, mode.as_wire())
    }

    fn save(&mut self) -> Vec<Outbound> {
        match self.state.save(&mut self.store, &self.keys) {
            Ok(()) => {
                tracing::info!(state = ?self.state, "Device state saved");
                self.events.publish(SessionEvent::Saved { state: self.state });
                self.echo(Target::Master, self.codes.save_ack)
            }
            Err(e) => {
                // Nothing is retried here; the next save request writes again.
                tracing::warn!(error = %e, "Failed to save device state");
                Vec::new()
            }
        }
    }

    fn update(&mut self, now: Instant, change: impl FnOnce(&mut DeviceState)) {
        change(&mut self.state);
        self.output.apply(&self.state, now);
        self.publish_change();
    }

    fn publish_change(&self) {
        self.events
            .publish(SessionEvent::StateChanged { state: self.state });
    }

    fn echo(&self, target: Target, value: u32) -> Vec<Outbound> {
        match self.codec.encode(target, value) {
            Ok(payload) => vec![Outbound::immediate(payload)],
            Err(e) => {
                tracing::warn!(field = %target, value, error = %e, "Dropping unencodable reply");
                Vec::new()
            }
        }
    }
}
