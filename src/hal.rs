// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hardware the phase control engine needs from its embedding.
//!
//! Trigger outputs are plain [embedded_hal::digital::OutputPin]s.
//! They must be infallible, because the tick interrupt has no way
//! to report a failed pin write.

use crate::table::NS_PER_SEC;

/// Tick timing requested from the hardware timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickPeriod {
    /// Period of the tick interrupt in nanoseconds.
    pub tick_ns: u32,
    /// Whole ticks per mains half-wave.
    pub ticks_per_halfwave: u16,
}

impl TickPeriod {
    /// Compare match value for a CTC mode timer running at `timer_clock_hz`.
    ///
    /// The timer counts `0..=value` per tick.
    /// With a 2 MHz timer clock this is `100 * 60 / mains_hz - 1`.
    pub const fn timer_compare(&self, timer_clock_hz: u32) -> u16 {
        let counts = (timer_clock_hz as u64 * self.tick_ns as u64) / NS_PER_SEC;
        if counts > u16::MAX as u64 {
            u16::MAX
        } else {
            (counts as u16).saturating_sub(1)
        }
    }
}

/// Interrupt sources driving a [crate::Dimmer].
///
/// The embedding forwards the zero-cross interrupt to
/// [crate::Dimmer::on_zero_cross] and the timer interrupt to
/// [crate::Dimmer::on_tick]. The two handlers must not preempt each other.
pub trait PhaseHal {
    /// Configure the zero-cross input for rising edge interrupts.
    fn setup_zero_cross(&mut self);

    /// Start the periodic tick timer.
    fn setup_tick_timer(&mut self, period: TickPeriod);

    /// Unmask the zero-cross and the tick timer interrupts.
    fn enable_interrupts(&mut self);
}

// vim: ts=4 sw=4 expandtab
