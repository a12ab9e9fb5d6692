// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use crate::{
    hw::{F_CPU, mcu},
    mutex::{IrqCtx, LazyMainInit, MainCtx},
    system::DIMMER,
};
use triacdim::TickPeriod;

#[allow(non_snake_case)]
pub struct Dp {
    pub TC2: mcu::TC2,
}

// SAFETY: Is initialized when constructing the MainCtx.
pub static DP: LazyMainInit<Dp> = unsafe { LazyMainInit::uninit() };

/// Timer 2 prescaler.
const TIMER_PS: u32 = 8;
/// Timer 2 count frequency.
pub const TIMER_CLOCK_HZ: u32 = F_CPU / TIMER_PS;

const TCCR2A_WGM21: u8 = 1 << 1;
const TCCR2B_CS21: u8 = 1 << 1;
const TIMSK2_OCIE2A: u8 = 1 << 1;
const TIFR2_OCF2A: u8 = 1 << 1;

/// Start Timer 2 in CTC mode with one compare match per tick.
#[rustfmt::skip]
pub fn timer_init(_m: &MainCtx, period: TickPeriod) {
    let compare = period.timer_compare(TIMER_CLOCK_HZ).min(0xFF) as u8;

    // Timer 2 configuration:
    // CS: 8 -> 0.5 us per timer count.
    // WGM: CTC, TOP = OCR2A.
    // SAFETY: Plain configuration values. The compare interrupt is still masked.
    unsafe {
        DP.TC2.timsk2().write(|w| w.bits(0));
        DP.TC2.tccr2b().write(|w| w.bits(0));
        DP.TC2.tcnt2().write(|w| w.bits(0));
        DP.TC2.ocr2a().write(|w| w.bits(compare));
        DP.TC2.tccr2a().write(|w| w.bits(TCCR2A_WGM21));
        DP.TC2.tifr2().write(|w| w.bits(TIFR2_OCF2A));
        DP.TC2.tccr2b().write(|w| w.bits(TCCR2B_CS21));
    }
}

pub fn timer_enable_irq(_m: &MainCtx) {
    // SAFETY: Only the compare A interrupt is used.
    unsafe {
        DP.TC2.timsk2().write(|w| w.bits(TIMSK2_OCIE2A));
    }
}

/// Restart the current tick.
///
/// The first tick after a zero crossing is a full tick.
#[inline(always)]
pub fn timer_restart(_c: &IrqCtx) {
    // SAFETY: Counter reset. Any count value is valid.
    unsafe {
        DP.TC2.tcnt2().write(|w| w.bits(0));
    }
}

pub fn irq_handler_timer2_compa(c: &IrqCtx) {
    DIMMER.on_tick(c.cs());
}

// vim: ts=4 sw=4 expandtab
