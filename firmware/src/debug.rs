// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Telemetry slots.
//!
//! With the `debug` feature the slots are streamed round robin over the UART
//! as `[id, lo, hi]` frames. A `[0xFF, 0xFF, 0xFF]` frame follows the last slot.

use crate::{hw::interrupt, mutex::Mutex};
use core::cell::Cell;

#[cfg(feature = "debug")]
use crate::{
    mutex::{IrqCtx, MainCtx},
    uart::uart_tx_cs,
};

#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Debug {
    Power0,
    Power1,
    ZeroCross,
    Setpoint0,
    Setpoint1,
    RegisterFailed,
}
const NRVALUES: usize = 6;

#[cfg(feature = "debug")]
const INDEXSHIFT: usize = 2;
#[cfg(feature = "debug")]
const INDEXMASK: u8 = (1 << INDEXSHIFT) - 1;

static VALUES: Mutex<[Cell<u16>; NRVALUES]> = Mutex::new([
    Cell::new(0),
    Cell::new(0),
    Cell::new(0),
    Cell::new(0),
    Cell::new(0),
    Cell::new(0),
]);
#[cfg(feature = "debug")]
static INDEX: Mutex<Cell<u8>> = Mutex::new(Cell::new(0));

#[cfg(feature = "debug")]
pub fn tx_complete_callback(c: &IrqCtx) {
    let cs = c.cs();
    let index = INDEX.borrow(cs).get();
    let id = index >> INDEXSHIFT;
    let txindex = index & INDEXMASK;

    let value = if id < NRVALUES as u8 {
        VALUES.borrow(cs)[id as usize].get()
    } else {
        0xFFFF
    };

    match txindex {
        0 => {
            let data = if id < NRVALUES as u8 { id } else { 0xFF };
            if uart_tx_cs(cs, data) {
                INDEX.borrow(cs).set(index + 1);
            }
        }
        1 => {
            if uart_tx_cs(cs, value as u8) {
                INDEX.borrow(cs).set(index + 1);
            }
        }
        2 => {
            if uart_tx_cs(cs, (value >> 8) as u8) {
                if id >= NRVALUES as u8 {
                    INDEX.borrow(cs).set(0);
                } else {
                    INDEX.borrow(cs).set((id + 1) << INDEXSHIFT);
                }
            }
        }
        _ => (),
    }
}

impl Debug {
    pub fn log_u16(&self, value: u16) {
        interrupt::free(|cs| {
            let id = *self as usize;
            let values = VALUES.borrow(cs);
            if id < values.len() {
                values[id].set(value);
            }
        });
    }

    pub fn log_u8(&self, value: u8) {
        self.log_u16(value.into())
    }
}

/// Kick off the telemetry stream.
///
/// Every completed byte transmission sends the next one.
#[cfg(feature = "debug")]
pub fn debug_init(_m: &MainCtx<'_>) {
    interrupt::free(|cs| {
        let index = INDEX.borrow(cs);
        if uart_tx_cs(cs, 0) {
            index.set(1);
        }
    });
}

// vim: ts=4 sw=4 expandtab
