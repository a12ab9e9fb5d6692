// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Phase-cut control of triac dimmers.
//!
//! Every mains half-wave starts at a zero crossing. A periodic tick timer
//! counts from there, and each channel's triac is triggered with a short
//! pulse once the count reaches the channel's phase delay. The delay is
//! looked up from a [CalibrationTable] by the requested power level:
//! the later the trigger, the less of the half-wave is conducted.
//!
//! The crate does not touch any hardware itself. The embedding provides
//! trigger outputs as [embedded_hal::digital::OutputPin]s, implements
//! [PhaseHal] and calls [Dimmer::on_zero_cross] and [Dimmer::on_tick]
//! from its interrupt handlers.

#![no_std]

#[cfg(all(feature = "mains-60hz", feature = "mains-50hz"))]
compile_error!("Enable only one of the features: mains-60hz, mains-50hz");
#[cfg(not(any(feature = "mains-60hz", feature = "mains-50hz")))]
compile_error!("Enable one of the features: mains-60hz, mains-50hz");

#[macro_use]
mod log;

mod channel;
mod clock;
mod dimmer;
mod error;
pub mod hal;
pub mod table;

pub use crate::{
    channel::ChannelId,
    clock::SharedClock,
    dimmer::{Dimmer, PowerUpdate},
    error::{Error, Precondition},
    hal::{PhaseHal, TickPeriod},
    table::{
        CalibrationTable, DEFAULT_PROFILE, PROFILE_50HZ, PROFILE_60HZ, Profile,
        TRIGGER_PULSE_TICKS,
    },
};
pub use critical_section::CriticalSection;

// vim: ts=4 sw=4 expandtab
