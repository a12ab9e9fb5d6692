// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use crate::{
    mutex::{MainCtx, MutexCell},
    system::SysPeriph,
};

#[derive(Clone, Copy)]
#[repr(u8)]
pub enum AdcChannel {
    Setpoint0,
    Setpoint1,
}

impl AdcChannel {
    pub const fn mask(&self) -> u8 {
        1 << *self as usize
    }

    pub fn select_next(&self) -> AdcChannel {
        match self {
            Self::Setpoint0 => Self::Setpoint1,
            Self::Setpoint1 => Self::Setpoint0,
        }
    }

    /// MUX value. The setpoints are on ADC0 and ADC1.
    const fn mux(&self) -> u8 {
        *self as u8
    }
}

const ADMUX_REFS_AVCC: u8 = 1 << 6;
const ADCSRA_ADEN: u8 = 1 << 7;
const ADCSRA_ADSC: u8 = 1 << 6;
const ADCSRA_ADIF: u8 = 1 << 4;
const ADCSRA_PS128: u8 = 0x07;

pub struct Adc {
    chan: MutexCell<AdcChannel>,
    running: MutexCell<bool>,
    result: [MutexCell<u16>; 2],
    ok: MutexCell<u8>,
}

impl Adc {
    pub const fn new() -> Self {
        Self {
            chan: MutexCell::new(AdcChannel::Setpoint0),
            running: MutexCell::new(false),
            result: [MutexCell::new(0), MutexCell::new(0)],
            ok: MutexCell::new(0),
        }
    }

    fn update_mux(&self, m: &MainCtx<'_>, sp: &SysPeriph) {
        let mux = self.chan.get(m).mux();
        // SAFETY: AVCC reference, single ended input.
        unsafe {
            sp.ADC.admux().write(|w| w.bits(ADMUX_REFS_AVCC | mux));
        }
    }

    #[inline]
    fn start_conversion(&self, _m: &MainCtx<'_>, sp: &SysPeriph) {
        // SAFETY: Writing ADIF clears a pending completion flag.
        unsafe {
            sp.ADC
                .adcsra()
                .write(|w| w.bits(ADCSRA_ADEN | ADCSRA_ADSC | ADCSRA_ADIF | ADCSRA_PS128));
        }
    }

    #[inline]
    fn conversion_done(&self, _m: &MainCtx<'_>, sp: &SysPeriph) -> bool {
        sp.ADC.adcsra().read().bits() & ADCSRA_ADIF != 0
    }

    pub fn init(&self, m: &MainCtx<'_>, sp: &SysPeriph) {
        // The first conversion after enabling is discarded.
        self.update_mux(m, sp);
        self.start_conversion(m, sp);
        while !self.conversion_done(m, sp) {}
    }

    /// Non-blocking round robin conversion of all channels.
    pub fn run(&self, m: &MainCtx<'_>, sp: &SysPeriph) {
        if self.running.get(m) && self.conversion_done(m, sp) {
            let chan = self.chan.get(m);
            self.result[chan as usize].set(m, sp.ADC.adc().read().bits());
            self.ok.set(m, self.ok.get(m) | chan.mask());
            self.chan.set(m, chan.select_next());
            self.running.set(m, false);
        }

        if !self.running.get(m) {
            self.update_mux(m, sp);
            self.start_conversion(m, sp);
            self.running.set(m, true);
        }
    }

    pub fn get_result(&self, m: &MainCtx<'_>, chan: AdcChannel) -> Option<u16> {
        if self.ok.get(m) & chan.mask() == 0 {
            None
        } else {
            Some(self.result[chan as usize].get(m))
        }
    }
}

// vim: ts=4 sw=4 expandtab
