// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::convert::Infallible;
use embedded_hal::digital::OutputPin;

/// Handle of a registered channel.
///
/// Ids are dense, starting at 0, in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(u8);

impl ChannelId {
    #[inline]
    pub(crate) const fn new(index: u8) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// One triac and its trigger state.
pub(crate) struct Channel<O> {
    output: O,
    level: u8,
    delay: u8,
}

impl<O: OutputPin<Error = Infallible>> Channel<O> {
    pub fn new(mut output: O, delay: u8) -> Self {
        let Ok(()) = output.set_low();
        Self {
            output,
            level: 0,
            delay,
        }
    }

    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[inline]
    pub fn delay(&self) -> u8 {
        self.delay
    }

    /// Level and delay always change together.
    #[inline]
    pub fn set(&mut self, level: u8, delay: u8) {
        self.level = level;
        self.delay = delay;
    }

    /// Deactivate the trigger output.
    #[inline(always)]
    pub fn release(&mut self) {
        let Ok(()) = self.output.set_low();
    }

    /// Drive the trigger output for tick `now`.
    ///
    /// `pulse` is the trigger pulse width in ticks.
    #[inline(always)]
    pub fn run(&mut self, now: u8, pulse: u8) {
        let now = u16::from(now);
        let start = u16::from(self.delay);
        let end = start + u16::from(pulse);

        if self.level == 0 || now >= end {
            let Ok(()) = self.output.set_low();
        } else if now >= start {
            let Ok(()) = self.output.set_high();
        }
    }
}

// vim: ts=4 sw=4 expandtab
