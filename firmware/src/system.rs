// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    analog::{Adc, AdcChannel},
    debug::Debug,
    exint::{EXINT, zerocross_count},
    filter::Filter,
    hw::mcu,
    mutex::{MainCtx, MutexCell, unwrap_result},
    ports::{TRIG_BITS, TriggerPin},
    timer::{timer_enable_irq, timer_init},
};
use triacdim::{ChannelId, DEFAULT_PROFILE, Dimmer, PhaseHal, PowerUpdate, TickPeriod};

/// Number of triac channels on the board.
pub const MAX_CHANNELS: usize = 2;

/// Full scale setpoint ADC value.
const ADC_MAX: u32 = 0x3FF;

const SETPOINT_FILTER_DIV: u16 = 4;

pub static DIMMER: Dimmer<TriggerPin, MAX_CHANNELS> = Dimmer::new(DEFAULT_PROFILE);

/// Convert a raw setpoint `0..=0x3FF` to a power level.
fn setpoint_to_level(adc: u16) -> u8 {
    let max = u32::from(DIMMER.profile().table.max_level());
    let adc = u32::from(adc).min(ADC_MAX);
    (adc * max / ADC_MAX) as u8
}

#[allow(non_snake_case)]
pub struct SysPeriph {
    pub ADC: mcu::ADC,
}

/// Zero-cross input and tick timer of the board.
struct Board<'a, 'cs> {
    m: &'a MainCtx<'cs>,
}

impl PhaseHal for Board<'_, '_> {
    fn setup_zero_cross(&mut self) {
        EXINT.setup(self.m);
    }

    fn setup_tick_timer(&mut self, period: TickPeriod) {
        timer_init(self.m, period);
    }

    fn enable_interrupts(&mut self) {
        timer_enable_irq(self.m);
        EXINT.enable_irq(self.m);
    }
}

pub struct System {
    adc: Adc,
    setpoint_filters: [Filter; MAX_CHANNELS],
    ids: MutexCell<[Option<ChannelId>; MAX_CHANNELS]>,
}

impl System {
    pub const fn new() -> Self {
        Self {
            adc: Adc::new(),
            setpoint_filters: [Filter::new(), Filter::new()],
            ids: MutexCell::new([None; MAX_CHANNELS]),
        }
    }

    pub fn init(&self, m: &MainCtx<'_>, sp: &SysPeriph) {
        self.adc.init(m, sp);

        let mut ids = [None; MAX_CHANNELS];
        let mut failed = 0;
        for (id, bit) in ids.iter_mut().zip(TRIG_BITS) {
            match DIMMER.register(TriggerPin::new(bit)) {
                Ok(i) => *id = Some(i),
                Err(_) => failed += 1,
            }
        }
        self.ids.set(m, ids);
        Debug::RegisterFailed.log_u8(failed);

        unwrap_result(DIMMER.begin(&mut Board { m }));
    }

    pub fn run(&self, m: &MainCtx<'_>, sp: &SysPeriph) {
        self.adc.run(m, sp);

        let chans = [AdcChannel::Setpoint0, AdcChannel::Setpoint1];
        let setpoint_dbg = [Debug::Setpoint0, Debug::Setpoint1];
        let power_dbg = [Debug::Power0, Debug::Power1];

        for (i, id) in self.ids.get(m).into_iter().enumerate() {
            let Some(id) = id else {
                continue;
            };
            let Some(raw) = self.adc.get_result(m, chans[i]) else {
                continue;
            };

            let setpoint = self.setpoint_filters[i].run(m, raw, SETPOINT_FILTER_DIV);
            setpoint_dbg[i].log_u16(setpoint);

            let level = setpoint_to_level(setpoint);
            match DIMMER.set_power(id, level) {
                Ok(PowerUpdate::Unchanged) => (),
                Ok(PowerUpdate::Changed | PowerUpdate::Clamped) => {
                    power_dbg[i].log_u8(level);
                }
                Err(_) => (),
            }
        }

        Debug::ZeroCross.log_u16(zerocross_count());
    }
}

// vim: ts=4 sw=4 expandtab
