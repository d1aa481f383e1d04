// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Portable system timer abstraction.
//!
//! Kernel code gets a monotonic, wrapping tick counter and a fixed set of
//! one-shot alarm channels, each holding an absolute deadline and a
//! callback fired from the timer interrupt. The register-level work is
//! delegated to a hardware-specific [`hil::Driver`]; this crate keeps the
//! channel table, maps all channels onto the single armed hardware
//! comparator, and dispatches callbacks under interrupt-context
//! constraints: no blocking, no allocation, short critical sections only.
//!
//! A port instantiates one [`SystemTimer`] over its driver, places it in
//! static storage, calls [`SystemTimer::init`] once during startup, and
//! invokes [`SystemTimer::handle_interrupt`] from the timer interrupt
//! service routine. The `critical-section` crate supplies the scoped
//! exclusive access used around the shared channel table; a port provides
//! the implementation that masks the timer interrupt.

#![no_std]
#![forbid(unsafe_code)]

pub mod hil;
pub mod st;
pub mod time;

pub use st::SystemTimer;

/// Errors returned synchronously by channel-indexed operations, never from
/// interrupt context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    /// The requested channel index is outside the configured channel
    /// count.
    InvalidChannel,
}

macro_rules! trace {
    ($s:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        defmt::trace!($s $(, $arg)*);
        #[cfg(not(feature = "defmt"))]
        { $( let _ = &$arg; )* }
    }};
}
pub(crate) use trace;
