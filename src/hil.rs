// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Hardware-facing interfaces of the system timer.

use crate::time::Ticks;

/// Operating mode of the backing hardware timer, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// The counter runs continuously and wraps; alarms are absolute
    /// deadlines compared against it.
    FreeRunning,
    /// The hardware generates a fixed-rate interrupt; the counter value is
    /// not exposed at this layer.
    Periodic,
}

/// Client of an alarm channel.
///
/// `fired` runs in interrupt context with the timer interrupt being
/// serviced. It must not block and must complete in bounded time; it may
/// arm or cancel any channel, including the one it was invoked for.
pub trait AlarmClient {
    fn fired(&self, alarm: usize);
}

/// Low-level driver for the hardware counter and alarm comparators.
///
/// Implementations do the register-level work; this layer only ever holds
/// one comparator (channel 0) armed at a time and multiplexes logical
/// alarm channels onto it. The driver's interrupt service routine is
/// expected to acknowledge the hardware event and then call
/// [`SystemTimer::handle_interrupt`](crate::SystemTimer::handle_interrupt).
pub trait Driver {
    type Ticks: Ticks;

    /// Number of hardware comparator channels, at least 1.
    const NUM_ALARMS: usize;

    /// One-time hardware setup: bring the counter (or the periodic event
    /// source) into running state. Called from
    /// [`SystemTimer::init`](crate::SystemTimer::init).
    fn init(&self, mode: Mode);

    /// Current counter reading. Only meaningful in free-running mode; in
    /// periodic mode the returned value is unspecified.
    fn get_counter(&self) -> Self::Ticks;

    fn is_alarm_active(&self, channel: usize) -> bool;

    /// Arm `channel` to fire at the absolute time `deadline`. If the
    /// deadline has already passed the driver must trigger the comparator
    /// event promptly rather than waiting for the counter to wrap.
    fn start_alarm(&self, channel: usize, deadline: Self::Ticks);

    fn stop_alarm(&self, channel: usize);

    /// Move an already-armed `channel` to a new deadline. Same
    /// already-passed contract as [`start_alarm`](Driver::start_alarm).
    fn set_alarm(&self, channel: usize, deadline: Self::Ticks);

    fn get_alarm(&self, channel: usize) -> Self::Ticks;
}
