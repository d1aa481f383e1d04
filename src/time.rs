// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Wrapping tick values for counter-like resources.
//!
//! A [`Ticks`] value counts hardware clock ticks since an arbitrary epoch
//! and wraps at the counter width. Absolute tick values therefore have no
//! total order: all time comparisons must go through the wrapping helpers
//! here, never through `<` on the raw value. The derived `Ord` on the
//! concrete types exists for comparing wrapped *differences* (distances),
//! which are plain magnitudes.

use core::fmt::Debug;

/// A fixed-width, wrapping tick count.
///
/// A deadline is considered reached once the counter is at or past it,
/// where "past" means within half the counter range after it. Deadlines
/// further than half the range in the future are indistinguishable from
/// the past and must not be armed.
pub trait Ticks: Clone + Copy + Debug + PartialEq + Eq + PartialOrd + Ord {
    /// Width of the counter in bits.
    const WIDTH: u32;

    fn from_u32(val: u32) -> Self;

    /// Lower 32 bits for counters wider than 32 bits.
    fn into_u32(self) -> u32;

    fn wrapping_add(self, other: Self) -> Self;

    fn wrapping_sub(self, other: Self) -> Self;

    /// All ones, the value at which the counter wraps.
    fn max_value() -> Self;

    fn half_max_value() -> Self;

    /// Whether `self`, read as the current time, has reached or passed
    /// `deadline`, accounting for wrap.
    fn expired(self, deadline: Self) -> bool {
        self.wrapping_sub(deadline) <= Self::half_max_value()
    }

    /// Whether `self` lies in `[start, end)` on the wrapping circle.
    fn within_range(self, start: Self, end: Self) -> bool {
        self.wrapping_sub(start) < end.wrapping_sub(start)
    }
}

macro_rules! ticks_impl {
    ($name:ident, $width:ty, $bits:expr) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name($width);

        impl $name {
            pub const fn new(val: $width) -> Self {
                $name(val)
            }
        }

        impl From<$width> for $name {
            fn from(val: $width) -> Self {
                $name(val)
            }
        }

        impl Ticks for $name {
            const WIDTH: u32 = $bits;

            fn from_u32(val: u32) -> Self {
                $name(val as $width)
            }

            fn into_u32(self) -> u32 {
                self.0 as u32
            }

            fn wrapping_add(self, other: Self) -> Self {
                $name(self.0.wrapping_add(other.0))
            }

            fn wrapping_sub(self, other: Self) -> Self {
                $name(self.0.wrapping_sub(other.0))
            }

            fn max_value() -> Self {
                $name(<$width>::MAX)
            }

            fn half_max_value() -> Self {
                $name(<$width>::MAX / 2)
            }
        }
    };
}

ticks_impl!(Ticks16, u16, 16);
ticks_impl!(Ticks32, u32, 32);
ticks_impl!(Ticks64, u64, 64);

#[cfg(test)]
mod tests {
    use super::{Ticks, Ticks16, Ticks32};

    #[test]
    fn expired_at_and_after_deadline() {
        let deadline = Ticks32::new(100);
        assert!(!Ticks32::new(99).expired(deadline));
        assert!(Ticks32::new(100).expired(deadline));
        assert!(Ticks32::new(101).expired(deadline));
    }

    #[test]
    fn expired_across_wrap() {
        let deadline = Ticks32::new(0x10);
        assert!(!Ticks32::new(0xFFFF_FFF0).expired(deadline));
        assert!(Ticks32::new(0x10).expired(deadline));
        assert!(Ticks32::new(0x20).expired(deadline));
    }

    #[test]
    fn future_deadline_not_expired_up_to_half_range() {
        let now = Ticks32::new(0);
        assert!(!now.expired(Ticks32::new(0x7FFF_FFFF)));
        // Past the half range the difference folds back into "elapsed".
        assert!(now.expired(Ticks32::new(0x8000_0001)));
    }

    #[test]
    fn within_range_wraps() {
        let start = Ticks32::new(0xFFFF_FFF0);
        let end = Ticks32::new(0x10);
        assert!(Ticks32::new(0xFFFF_FFFF).within_range(start, end));
        assert!(Ticks32::new(0x0).within_range(start, end));
        assert!(!Ticks32::new(0x10).within_range(start, end));
        assert!(!Ticks32::new(0x20).within_range(start, end));
    }

    #[test]
    fn width_and_range_constants() {
        assert_eq!(Ticks16::WIDTH, 16);
        assert_eq!(Ticks16::max_value(), Ticks16::new(0xFFFF));
        assert_eq!(Ticks32::half_max_value(), Ticks32::new(0x7FFF_FFFF));
    }

    #[test]
    fn sixteen_bit_wrap() {
        let now = Ticks16::new(5);
        assert_eq!(now.wrapping_sub(Ticks16::new(0xFFFB)), Ticks16::new(10));
        assert!(now.expired(Ticks16::new(0xFFFB)));
        assert!(!Ticks16::new(0xFFFA).expired(Ticks16::new(0xFFFB)));
    }
}
