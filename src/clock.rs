// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cell::Cell;
use critical_section::{CriticalSection, Mutex};

/// Ticks since the last mains zero crossing.
///
/// Only the zero-cross and the tick interrupt handlers modify the counter.
/// Both hold a [CriticalSection], which makes every read-modify-write
/// indivisible.
pub struct SharedClock {
    ticks: Mutex<Cell<u8>>,
}

impl SharedClock {
    pub const fn new() -> Self {
        Self {
            ticks: Mutex::new(Cell::new(0)),
        }
    }

    /// Restart counting at the zero crossing.
    #[inline(always)]
    pub fn reset(&self, cs: CriticalSection<'_>) {
        self.ticks.borrow(cs).set(0);
    }

    /// Count one tick and return the new count.
    ///
    /// The count saturates instead of wrapping around.
    /// Without zero crossings it must not run into a trigger window again.
    #[inline(always)]
    pub fn advance(&self, cs: CriticalSection<'_>) -> u8 {
        let ticks = self.ticks.borrow(cs);
        let now = ticks.get().saturating_add(1);
        ticks.set(now);
        now
    }

    #[inline(always)]
    pub fn now(&self, cs: CriticalSection<'_>) -> u8 {
        self.ticks.borrow(cs).get()
    }
}

impl Default for SharedClock {
    fn default() -> Self {
        Self::new()
    }
}


// vim: ts=4 sw=4 expandtab
