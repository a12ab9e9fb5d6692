// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use crate::{
    hw::mcu,
    mutex::{LazyMainInit, MainInitCtx},
};
use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, OutputPin};

macro_rules! impl_port {
    (
        $struct:ident,
        $name:ident,
        $port:ident,
        $ddr:ident
    ) => {
        #[allow(non_snake_case)]
        pub struct $struct {
            pub $name: mcu::$name,
        }

        // SAFETY: Is initialized when constructing the MainCtx.
        pub static $name: LazyMainInit<$struct> = unsafe { LazyMainInit::uninit() };

        impl LazyMainInit<$struct> {
            /// Read-modify-write of one port bit.
            ///
            /// Each bit must have one owner context.
            #[inline(always)]
            pub fn set(&self, bit: u8, value: bool) {
                let mask = 1 << bit;
                // SAFETY: All bit patterns are valid port values.
                self.$name.$port().modify(|r, w| unsafe {
                    if value {
                        w.bits(r.bits() | mask)
                    } else {
                        w.bits(r.bits() & !mask)
                    }
                });
            }

            #[inline(always)]
            fn setup(&self, port: u8, ddr: u8) {
                // SAFETY: All bit patterns are valid port and direction values.
                unsafe {
                    self.$name.$port().write(|w| w.bits(port));
                    self.$name.$ddr().write(|w| w.bits(ddr));
                }
            }
        }
    };
}

impl_port!(PortB, PORTB, portb, ddrb);
impl_port!(PortC, PORTC, portc, ddrc);
impl_port!(PortD, PORTD, portd, ddrd);

fn pin_input(_bit: usize) -> u8 {
    0
}
fn pin_output(bit: usize) -> u8 {
    1 << bit
}
fn pin_low(_bit: usize) -> u8 {
    0
}
fn pin_high(bit: usize) -> u8 {
    1 << bit
}
fn pin_floating(_bit: usize) -> u8 {
    0
}
fn pin_pullup(bit: usize) -> u8 {
    1 << bit
}

/// Trigger output bits on PORTD.
pub const TRIG_BITS: [u8; 2] = [4, 5];

#[rustfmt::skip]
pub fn ports_setup(_: &MainInitCtx) {
    // Called with interrupts disabled. Ensured by &MainInitCtx.
    PORTB.setup(
        pin_low(0) | // DNC
        pin_low(1) | // DNC
        pin_low(2) | // DNC
        pin_low(3) | // ISP MOSI
        pin_low(4) | // ISP MISO
        pin_low(5) | // ISP SCK
        pin_floating(6) | // XTAL1
        pin_floating(7), // XTAL2
        pin_output(0) | // DNC
        pin_output(1) | // DNC
        pin_output(2) | // DNC
        pin_output(3) | // ISP MOSI
        pin_output(4) | // ISP MISO
        pin_output(5) | // ISP SCK
        pin_input(6) | // XTAL1
        pin_input(7), // XTAL2
    );
    PORTC.setup(
        pin_floating(0) | // setpoint 0, single ended ADC
        pin_floating(1) | // setpoint 1, single ended ADC
        pin_low(2) | // DNC
        pin_low(3) | // DNC
        pin_low(4) | // DNC
        pin_low(5) | // DNC
        pin_floating(6), // RESET
        pin_input(0) | // setpoint 0, single ended ADC
        pin_input(1) | // setpoint 1, single ended ADC
        pin_output(2) | // DNC
        pin_output(3) | // DNC
        pin_output(4) | // DNC
        pin_output(5) | // DNC
        pin_input(6), // RESET
    );
    PORTD.setup(
        pin_pullup(0) | // UART RXD
        pin_high(1) | // UART TXD
        pin_floating(2) | // zero-cross, INT0
        pin_low(3) | // DNC
        pin_low(4) | // trig 0, active high
        pin_low(5) | // trig 1, active high
        pin_low(6) | // DNC
        pin_low(7), // DNC
        pin_input(0) | // UART RXD
        pin_output(1) | // UART TXD
        pin_input(2) | // zero-cross, INT0
        pin_output(3) | // DNC
        pin_output(4) | // trig 0, active high
        pin_output(5) | // trig 1, active high
        pin_output(6) | // DNC
        pin_output(7), // DNC
    );
}

/// Triac trigger output on PORTD.
///
/// After `begin` this is only driven from the zero-cross and tick interrupts.
pub struct TriggerPin {
    bit: u8,
}

impl TriggerPin {
    pub const fn new(bit: u8) -> Self {
        Self { bit }
    }
}

impl ErrorType for TriggerPin {
    type Error = Infallible;
}

impl OutputPin for TriggerPin {
    #[inline(always)]
    fn set_low(&mut self) -> Result<(), Infallible> {
        PORTD.set(self.bit, false);
        Ok(())
    }

    #[inline(always)]
    fn set_high(&mut self) -> Result<(), Infallible> {
        PORTD.set(self.bit, true);
        Ok(())
    }
}

// vim: ts=4 sw=4 expandtab
