// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use crate::{
    hw::{interrupt, mcu},
    mutex::{IrqCtx, LazyMainInit, MainCtx, Mutex},
    system::DIMMER,
    timer::timer_restart,
};
use core::cell::Cell;

#[allow(non_snake_case)]
pub struct ExInt {
    pub EXINT: mcu::EXINT,
}

// SAFETY: Is initialized when constructing the MainCtx.
pub static EXINT: LazyMainInit<ExInt> = unsafe { LazyMainInit::uninit() };

const EICRA_ISC01: u8 = 1 << 1;
const EICRA_ISC00: u8 = 1 << 0;
const EIMSK_INT0: u8 = 1 << 0;
const EIFR_INTF0: u8 = 1 << 0;

/// Number of zero crossings seen. Wraps around.
static ZEROCROSS_COUNT: Mutex<Cell<u16>> = Mutex::new(Cell::new(0));

impl ExInt {
    /// INT0 (PD2) on rising edge. The interrupt stays masked.
    pub fn setup(&self, _m: &MainCtx) {
        // SAFETY: Plain configuration values.
        unsafe {
            self.EXINT.eimsk().write(|w| w.bits(0));
            self.EXINT.eicra().write(|w| w.bits(EICRA_ISC01 | EICRA_ISC00));
            self.EXINT.eifr().write(|w| w.bits(EIFR_INTF0));
        }
    }

    pub fn enable_irq(&self, _m: &MainCtx) {
        // SAFETY: Only INT0 is used.
        unsafe {
            self.EXINT.eimsk().write(|w| w.bits(EIMSK_INT0));
        }
    }
}

pub fn zerocross_count() -> u16 {
    interrupt::free(|cs| ZEROCROSS_COUNT.borrow(cs).get())
}

pub fn irq_handler_int0(c: &IrqCtx) {
    let cs = c.cs();

    timer_restart(c);
    DIMMER.on_zero_cross(cs);

    let count = ZEROCROSS_COUNT.borrow(cs);
    count.set(count.get().wrapping_add(1));
}

// vim: ts=4 sw=4 expandtab
