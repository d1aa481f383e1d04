// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Alarm channel table, scheduler and interrupt-time dispatch.
//!
//! [`SystemTimer`] multiplexes `NUM_ALARMS` logical alarm channels onto
//! hardware comparator 0 of the low-level [`Driver`]: the channel table is
//! the source of truth for which callbacks are owed and when, while the
//! single armed comparator always holds the earliest active deadline.
//!
//! The table is shared between foreground arm/cancel calls and the
//! interrupt-time dispatch, so every compound read-modify-write runs
//! inside `critical_section::with`; a port maps that to its interrupt-mask
//! primitive. A single core is assumed: dispatch itself runs with the
//! timer interrupt being serviced and cannot be preempted by foreground
//! calls.

use core::cell::Cell;

use crate::hil::{AlarmClient, Driver, Mode};
use crate::time::Ticks;
use crate::ErrorCode;

struct AlarmSlot<'a, T: Ticks> {
    active: Cell<bool>,
    deadline: Cell<T>,
    callback: Cell<Option<&'a dyn AlarmClient>>,
}

impl<'a, T: Ticks> AlarmSlot<'a, T> {
    fn new() -> Self {
        AlarmSlot {
            active: Cell::new(false),
            deadline: Cell::new(T::from_u32(0)),
            callback: Cell::new(None),
        }
    }
}

/// System timer core: counter access, alarm scheduling and dispatch.
///
/// `NUM_ALARMS` is the number of logical alarm channels and is fixed at
/// build time, minimum 1. Channel 0 always exists and backs the
/// channel-less operations; its callback is installed once via
/// [`set_client`](SystemTimer::set_client). The value is expected to live
/// in static storage for the life of the process; nothing is allocated.
pub struct SystemTimer<'a, D: Driver, const NUM_ALARMS: usize> {
    driver: &'a D,
    mode: Mode,
    slots: [AlarmSlot<'a, D::Ticks>; NUM_ALARMS],
}

impl<'a, D: Driver, const NUM_ALARMS: usize> SystemTimer<'a, D, NUM_ALARMS> {
    const CHANNELS_VALID: () = {
        assert!(NUM_ALARMS >= 1, "at least one alarm channel is required");
        assert!(D::NUM_ALARMS >= 1, "driver must expose a comparator");
    };

    pub fn new(driver: &'a D, mode: Mode) -> Self {
        let () = Self::CHANNELS_VALID;
        SystemTimer {
            driver,
            mode,
            slots: core::array::from_fn(|_| AlarmSlot::new()),
        }
    }

    /// One-time subsystem setup, called exactly once before any other
    /// operation: resets every channel to inactive and starts the hardware
    /// counter. Installed channel-0 clients survive a reset.
    pub fn init(&self) {
        critical_section::with(|_| {
            for slot in &self.slots {
                slot.active.set(false);
                slot.deadline.set(D::Ticks::from_u32(0));
            }
            self.driver.init(self.mode);
        });
    }

    /// Current counter reading.
    ///
    /// Only meaningful in free-running mode; in periodic mode the returned
    /// value is unspecified. This is a precondition, not a checked error.
    pub fn get_counter(&self) -> D::Ticks {
        self.driver.get_counter()
    }

    /// Install the channel-0 client invoked by the channel-less alarm
    /// operations.
    pub fn set_client(&self, client: &'a dyn AlarmClient) {
        self.slots[0].callback.set(Some(client));
    }

    /// Arm channel 0 to fire at `deadline`, using the client installed
    /// with [`set_client`](SystemTimer::set_client). Overwrites any
    /// pending deadline on channel 0.
    pub fn start_alarm(&self, deadline: D::Ticks) {
        self.do_start(0, deadline, None);
    }

    /// Arm channel `alarm` to fire `client` at `deadline`, overwriting any
    /// pending state for that channel.
    pub fn start_alarm_n(
        &self,
        alarm: usize,
        deadline: D::Ticks,
        client: &'a dyn AlarmClient,
    ) -> Result<(), ErrorCode> {
        self.check(alarm)?;
        self.do_start(alarm, deadline, Some(client));
        Ok(())
    }

    /// Cancel channel 0. Canceling an inactive channel is a no-op.
    pub fn stop_alarm(&self) {
        self.do_stop(0);
    }

    /// Cancel channel `alarm`. Canceling an inactive channel is a no-op.
    pub fn stop_alarm_n(&self, alarm: usize) -> Result<(), ErrorCode> {
        self.check(alarm)?;
        self.do_stop(alarm);
        Ok(())
    }

    /// Move channel 0 to a new deadline without touching its callback.
    /// The channel is expected to be armed already.
    pub fn set_alarm(&self, deadline: D::Ticks) {
        self.do_start(0, deadline, None);
    }

    /// Move channel `alarm` to a new deadline without touching its
    /// callback. The channel is expected to be armed already.
    pub fn set_alarm_n(&self, alarm: usize, deadline: D::Ticks) -> Result<(), ErrorCode> {
        self.check(alarm)?;
        self.do_start(alarm, deadline, None);
        Ok(())
    }

    /// Last deadline stored for channel 0, whether or not it is active.
    /// Zero if the channel was never armed.
    pub fn get_alarm(&self) -> D::Ticks {
        self.slots[0].deadline.get()
    }

    /// Last deadline stored for channel `alarm`, whether or not it is
    /// active. Zero if the channel was never armed.
    pub fn get_alarm_n(&self, alarm: usize) -> Result<D::Ticks, ErrorCode> {
        self.check(alarm)?;
        Ok(self.slots[alarm].deadline.get())
    }

    pub fn is_alarm_active(&self) -> bool {
        self.slots[0].active.get()
    }

    pub fn is_alarm_active_n(&self, alarm: usize) -> Result<bool, ErrorCode> {
        self.check(alarm)?;
        Ok(self.slots[alarm].active.get())
    }

    /// Interrupt-time dispatch, called by the driver's interrupt service
    /// routine after it has acknowledged the hardware event.
    ///
    /// In free-running mode this fires every due channel in ascending
    /// index order, clearing its active flag before invoking the callback
    /// so the callback can immediately re-arm its own channel, then
    /// recomputes the next deadline once from the final table state and
    /// reprograms or disarms the comparator. In periodic mode every
    /// hardware event is a tick for the channel-0 client.
    pub fn handle_interrupt(&self) {
        if self.mode == Mode::Periodic {
            if let Some(client) = self.slots[0].callback.get() {
                client.fired(0);
            }
            return;
        }

        let now = self.driver.get_counter();
        for (alarm, slot) in self.slots.iter().enumerate() {
            if slot.active.get() && now.expired(slot.deadline.get()) {
                // Clear before invoking: a re-arm from inside the callback
                // must not look like the stale pending state.
                slot.active.set(false);
                crate::trace!("st: fire alarm {}", alarm);
                if let Some(client) = slot.callback.get() {
                    client.fired(alarm);
                }
            }
        }

        // Callbacks may have armed or canceled any channel; one final
        // recomputation from the resulting table state converges on the
        // correct next deadline.
        critical_section::with(|_| self.reprogram());
    }

    fn check(&self, alarm: usize) -> Result<(), ErrorCode> {
        if alarm < NUM_ALARMS {
            Ok(())
        } else {
            Err(ErrorCode::InvalidChannel)
        }
    }

    fn do_start(&self, alarm: usize, deadline: D::Ticks, client: Option<&'a dyn AlarmClient>) {
        critical_section::with(|_| {
            let slot = &self.slots[alarm];
            slot.deadline.set(deadline);
            if let Some(client) = client {
                slot.callback.set(Some(client));
            }
            slot.active.set(true);
            crate::trace!("st: arm alarm {} at {}", alarm, deadline.into_u32());
            self.reprogram();
        });
    }

    fn do_stop(&self, alarm: usize) {
        critical_section::with(|_| {
            let slot = &self.slots[alarm];
            if slot.active.get() {
                slot.active.set(false);
                crate::trace!("st: cancel alarm {}", alarm);
                self.reprogram();
            }
        });
    }

    /// Program comparator 0 with the earliest active deadline, or disarm
    /// it when no channel is active. Runs inside a critical section.
    fn reprogram(&self) {
        let now = self.driver.get_counter();
        let zero = D::Ticks::from_u32(0);
        let mut next: Option<D::Ticks> = None;
        let mut best: Option<D::Ticks> = None;

        for slot in &self.slots {
            if !slot.active.get() {
                continue;
            }
            let deadline = slot.deadline.get();
            // Distance until due; an already-passed deadline is due now.
            // Raw ordering is valid here because these are wrapped
            // differences, not absolute times.
            let distance = if now.expired(deadline) {
                zero
            } else {
                deadline.wrapping_sub(now)
            };
            if best.map_or(true, |b| distance < b) {
                best = Some(distance);
                next = Some(deadline);
            }
        }

        match next {
            Some(deadline) => {
                if self.driver.is_alarm_active(0) {
                    self.driver.set_alarm(0, deadline);
                } else {
                    self.driver.start_alarm(0, deadline);
                }
            }
            None => {
                if self.driver.is_alarm_active(0) {
                    self.driver.stop_alarm(0);
                }
            }
        }
    }
}
