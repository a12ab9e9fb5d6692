// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use crate::{
    debug,
    hw::{F_CPU, mcu},
    mutex::{CriticalSection, IrqCtx, LazyMainInit, MainInitCtx},
};

const BAUD: u32 = 19_200;
const UBRR: u16 = (F_CPU / (16 * BAUD) - 1) as u16;

const UCSR0A_UDRE0: u8 = 1 << 5;
const UCSR0B_TXCIE0: u8 = 1 << 6;
const UCSR0B_TXEN0: u8 = 1 << 3;
const UCSR0C_8N1: u8 = (1 << 2) | (1 << 1);

#[allow(non_snake_case)]
pub struct Dp {
    pub USART0: mcu::USART0,
}

// SAFETY: Is initialized when constructing the MainCtx.
pub static DP: LazyMainInit<Dp> = unsafe { LazyMainInit::uninit() };

impl Dp {
    /// Transmit only, 8N1.
    pub fn setup(&self, _c: &MainInitCtx) {
        // SAFETY: Plain configuration values.
        unsafe {
            self.USART0.ubrr0().write(|w| w.bits(UBRR));
            self.USART0.ucsr0c().write(|w| w.bits(UCSR0C_8N1));
            self.USART0
                .ucsr0b()
                .write(|w| w.bits(UCSR0B_TXEN0 | UCSR0B_TXCIE0));
        }
    }
}

pub fn irq_handler_usart_tx(c: &IrqCtx) {
    debug::tx_complete_callback(c);
}

/// Start transmission of one byte.
///
/// Returns false, if the transmitter is busy.
pub fn uart_tx_cs(_cs: CriticalSection<'_>, data: u8) -> bool {
    if DP.USART0.ucsr0a().read().bits() & UCSR0A_UDRE0 == 0 {
        return false;
    }
    // SAFETY: Any byte can be transmitted.
    unsafe {
        DP.USART0.udr0().write(|w| w.bits(data));
    }
    true
}

// vim: ts=4 sw=4 expandtab
