// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Maps [`DeviceState`] onto the [`Actuator`].
//!
//! The driver owns the actuator and is the only place that writes to it.
//! It keeps two pieces of state of its own:
//!
//! - whether it is *engaged*: a forced safe state (peer disconnect)
//!   disengages it, and it stays inactive until the next command re-applies
//!   the device state
//! - the blink phase and the instant of the next toggle

use std::time::{Duration, Instant};

use crate::port::Actuator;
use crate::state::DeviceState;
use crate::types::{OutputVariant, PowerLevel};

/// Drives the physical output from the device state.
#[derive(Debug)]
pub struct OutputDriver<A> {
    actuator: A,
    variant: OutputVariant,
    blink_period: Duration,
    engaged: bool,
    lit: bool,
    next_toggle: Option<Instant>,
}

impl<A: Actuator> OutputDriver<A> {
    /// Creates a disengaged driver. The actuator is not touched.
    #[must_use]
    pub fn new(actuator: A, variant: OutputVariant, blink_period: Duration) -> Self {
        Self {
            actuator,
            variant,
            blink_period,
            engaged: false,
            lit: false,
            next_toggle: None,
        }
    }

    /// Drives the actuator to match `state` and restarts the blink phase.
    pub fn apply(&mut self, state: &DeviceState, now: Instant) {
        self.engaged = true;
        let active = state.output_enabled();
        self.write(active, state.power_level());
        self.next_toggle = state.is_blinking().then(|| now + self.blink_period);
    }

    /// Drives the actuator inactive and disengages until the next `apply`.
    pub fn force_safe(&mut self) {
        self.engaged = false;
        self.next_toggle = None;
        self.write(false, PowerLevel::MIN);
    }

    /// Toggles a blinking output once its period has elapsed.
    ///
    /// Returns `true` if the actuator was written.
    pub fn tick(&mut self, state: &DeviceState, now: Instant) -> bool {
        if !self.engaged || !state.is_blinking() {
            self.next_toggle = None;
            return false;
        }

        let due = *self.next_toggle.get_or_insert(now + self.blink_period);
        if now < due {
            return false;
        }

        let lit = !self.lit;
        self.write(lit, state.power_level());
        tracing::trace!(lit, "Blink toggle");

        // A stalled loop resumes from now instead of replaying missed toggles.
        let next = due + self.blink_period;
        self.next_toggle = Some(if next <= now {
            now + self.blink_period
        } else {
            next
        });
        true
    }

    /// Returns `true` if the output is currently at its active level.
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Returns `false` after a forced safe state until the next `apply`.
    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Returns the instant of the next blink toggle, if blinking.
    #[must_use]
    pub fn next_toggle(&self) -> Option<Instant> {
        self.next_toggle
    }

    /// Returns the actuator.
    #[must_use]
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    fn write(&mut self, active: bool, level: PowerLevel) {
        self.lit = active;
        match self.variant {
            OutputVariant::Digital => self.actuator.set_digital_output(active),
            OutputVariant::Pwm => {
                let duty = if active { level } else { PowerLevel::MIN };
                self.actuator.set_pwm_level(duty);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    #[derive(Debug, Default)]
    struct Recorder {
        digital: Vec<bool>,
        pwm: Vec<u8>,
    }

    impl Actuator for Recorder {
        fn set_digital_output(&mut self, active: bool) {
            self.digital.push(active);
        }

        fn set_pwm_level(&mut self, level: PowerLevel) {
            self.pwm.push(level.value());
        }
    }

    const PERIOD: Duration = Duration::from_millis(500);

    fn pwm() -> OutputDriver<Recorder> {
        OutputDriver::new(Recorder::default(), OutputVariant::Pwm, PERIOD)
    }

    #[test]
    fn new_does_not_touch_actuator() {
        let driver = pwm();
        assert!(driver.actuator().pwm.is_empty());
        assert!(!driver.is_engaged());
    }

    #[test]
    fn apply_enabled_pwm_drives_level() {
        let mut driver = pwm();
        let state = DeviceState::new(true, PowerLevel::from(77), Mode::Static);
        driver.apply(&state, Instant::now());
        assert_eq!(driver.actuator().pwm, vec![77]);
        assert!(driver.is_lit());
    }

    #[test]
    fn apply_disabled_is_inactive_regardless_of_level_and_mode() {
        let mut driver = pwm();
        let state = DeviceState::new(false, PowerLevel::MAX, Mode::Blinking);
        driver.apply(&state, Instant::now());
        assert_eq!(driver.actuator().pwm, vec![0]);
        assert_eq!(driver.next_toggle(), None);
    }

    #[test]
    fn digital_variant_uses_digital_output() {
        let mut driver = OutputDriver::new(Recorder::default(), OutputVariant::Digital, PERIOD);
        driver.apply(
            &DeviceState::new(true, PowerLevel::from(3), Mode::Static),
            Instant::now(),
        );
        driver.force_safe();
        assert_eq!(driver.actuator().digital, vec![true, false]);
        assert!(driver.actuator().pwm.is_empty());
    }

    #[test]
    fn blinking_toggles_each_period() {
        let mut driver = pwm();
        let start = Instant::now();
        let state = DeviceState::new(true, PowerLevel::from(200), Mode::Blinking);
        driver.apply(&state, start);

        assert!(!driver.tick(&state, start + PERIOD / 2));
        assert!(driver.tick(&state, start + PERIOD));
        assert!(!driver.tick(&state, start + PERIOD + PERIOD / 2));
        assert!(driver.tick(&state, start + PERIOD * 2));

        assert_eq!(driver.actuator().pwm, vec![200, 0, 200]);
    }

    #[test]
    fn stalled_loop_toggles_once() {
        let mut driver = pwm();
        let start = Instant::now();
        let state = DeviceState::new(true, PowerLevel::MAX, Mode::Blinking);
        driver.apply(&state, start);

        assert!(driver.tick(&state, start + PERIOD * 10));
        assert!(!driver.tick(&state, start + PERIOD * 10));
        assert_eq!(driver.next_toggle(), Some(start + PERIOD * 11));
    }

    #[test]
    fn static_mode_never_toggles() {
        let mut driver = pwm();
        let start = Instant::now();
        let state = DeviceState::new(true, PowerLevel::MAX, Mode::Static);
        driver.apply(&state, start);
        assert!(!driver.tick(&state, start + PERIOD * 3));
        assert_eq!(driver.actuator().pwm, vec![255]);
    }

    #[test]
    fn force_safe_stops_blinking_until_reapplied() {
        let mut driver = pwm();
        let start = Instant::now();
        let state = DeviceState::new(true, PowerLevel::MAX, Mode::Blinking);
        driver.apply(&state, start);
        driver.force_safe();

        assert!(!driver.tick(&state, start + PERIOD * 4));
        assert_eq!(driver.actuator().pwm, vec![255, 0]);

        driver.apply(&state, start + PERIOD * 4);
        assert!(driver.tick(&state, start + PERIOD * 5));
    }
}
