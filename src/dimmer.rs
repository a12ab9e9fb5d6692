// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    channel::{Channel, ChannelId},
    clock::SharedClock,
    error::Error,
    hal::PhaseHal,
    table::{Profile, TRIGGER_PULSE_TICKS},
};
use core::{
    cell::{Cell, RefCell},
    convert::Infallible,
};
use critical_section::{CriticalSection, Mutex};
use embedded_hal::digital::OutputPin;

/// Outcome of [Dimmer::set_power].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerUpdate {
    /// The channel already had the requested level.
    Unchanged,
    /// The new level is in effect.
    Changed,
    /// The request was above the maximum level.
    /// The maximum level is in effect.
    Clamped,
}

struct Channels<O, const N: usize> {
    slots: [Option<Channel<O>>; N],
    count: u8,
}

impl<O: OutputPin<Error = Infallible>, const N: usize> Channels<O, N> {
    const fn new() -> Self {
        Self {
            slots: [const { None }; N],
            count: 0,
        }
    }

    fn push(&mut self, channel: Channel<O>) -> Result<ChannelId, Error> {
        let index = self.count;
        let slot = self
            .slots
            .get_mut(index as usize)
            .ok_or(Error::CapacityExceeded)?;
        *slot = Some(channel);
        self.count += 1;
        Ok(ChannelId::new(index))
    }

    fn get(&self, id: ChannelId) -> Result<&Channel<O>, Error> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownChannel)
    }

    fn get_mut(&mut self, id: ChannelId) -> Result<&mut Channel<O>, Error> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownChannel)
    }

    #[inline(always)]
    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Channel<O>> {
        self.slots[..self.count as usize].iter_mut().flatten()
    }
}

/// Phase-cut controller for up to `N` triac channels.
///
/// Channels are registered and their power is set from main context.
/// The embedding forwards its zero-cross interrupt to [Self::on_zero_cross]
/// and its periodic timer interrupt to [Self::on_tick].
///
/// Usage order:
///
/// 1. [Self::register] every channel.
/// 2. [Self::begin] exactly once.
/// 3. [Self::set_power], [Self::off] and [Self::power] at any time.
pub struct Dimmer<O, const N: usize> {
    profile: Profile,
    pulse: u8,
    clock: SharedClock,
    started: Mutex<Cell<bool>>,
    channels: Mutex<RefCell<Channels<O, N>>>,
}

impl<O: OutputPin<Error = Infallible>, const N: usize> Dimmer<O, N> {
    /// Create a dimmer with the default trigger pulse width.
    pub const fn new(profile: Profile) -> Self {
        Self::with_pulse_width(profile, TRIGGER_PULSE_TICKS)
    }

    /// Create a dimmer with a trigger pulse of `pulse` ticks.
    pub const fn with_pulse_width(profile: Profile, pulse: u8) -> Self {
        assert!(N <= u8::MAX as usize, "Too many channels.");
        Self {
            profile,
            pulse,
            clock: SharedClock::new(),
            started: Mutex::new(Cell::new(false)),
            channels: Mutex::new(RefCell::new(Channels::new())),
        }
    }

    pub const fn profile(&self) -> &Profile {
        &self.profile
    }

    pub const fn pulse_width(&self) -> u8 {
        self.pulse
    }

    /// Maximum number of channels.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.channels.borrow_ref(cs).count as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_started(&self) -> bool {
        critical_section::with(|cs| self.started.borrow(cs).get())
    }

    /// Add a channel driving the trigger `output`.
    ///
    /// The output is driven inactive and the channel starts at power level 0.
    /// Only allowed before [Self::begin].
    pub fn register(&self, output: O) -> Result<ChannelId, Error> {
        let delay = self.profile.table.delay(0);
        let ret = critical_section::with(|cs| {
            if self.started.borrow(cs).get() {
                return Err(Error::ALREADY_STARTED);
            }
            let mut channels = self.channels.borrow_ref_mut(cs);
            if channels.count as usize >= N {
                // Leave the rejected output untouched.
                return Err(Error::CapacityExceeded);
            }
            channels.push(Channel::new(output, delay))
        });
        match ret {
            Ok(id) => log!(debug, "triacdim: registered channel {}", id),
            Err(e) => log!(warn, "triacdim: channel registration failed: {}", e),
        }
        ret
    }

    /// Arm the hardware and start phase control.
    ///
    /// Must be called exactly once, after all channels are registered.
    /// A repeated call fails and leaves the hardware alone.
    pub fn begin<H: PhaseHal>(&self, hal: &mut H) -> Result<(), Error> {
        critical_section::with(|cs| {
            let started = self.started.borrow(cs);
            if started.get() {
                return Err(Error::ALREADY_STARTED);
            }
            started.set(true);
            self.clock.reset(cs);
            Ok(())
        })?;

        hal.setup_zero_cross();
        hal.setup_tick_timer(self.profile.tick_period());
        hal.enable_interrupts();

        log!(
            info,
            "triacdim: started {} channels, {} Hz, {} ns tick",
            self.len(),
            self.profile.mains_hz,
            self.profile.tick_ns
        );
        Ok(())
    }

    /// Request a power level for a channel.
    ///
    /// Levels above the calibration table's maximum are clamped
    /// and reported as [PowerUpdate::Clamped].
    pub fn set_power(&self, id: ChannelId, level: u8) -> Result<PowerUpdate, Error> {
        let table = self.profile.table;
        let clamped = table.clamp(level);
        let delay = table.delay(clamped);

        // Level and delay are updated in one critical section.
        // The tick interrupt never sees a half-done update.
        let changed = critical_section::with(|cs| {
            if !self.started.borrow(cs).get() {
                return Err(Error::NOT_STARTED);
            }
            let mut channels = self.channels.borrow_ref_mut(cs);
            let channel = channels.get_mut(id)?;
            if channel.level() == clamped {
                Ok(false)
            } else {
                channel.set(clamped, delay);
                Ok(true)
            }
        })?;

        if clamped != level {
            log!(warn, "triacdim: channel {} power {} clamped", id, level);
            Ok(PowerUpdate::Clamped)
        } else if changed {
            Ok(PowerUpdate::Changed)
        } else {
            Ok(PowerUpdate::Unchanged)
        }
    }

    /// Switch a channel off. Same as power level 0.
    pub fn off(&self, id: ChannelId) -> Result<PowerUpdate, Error> {
        self.set_power(id, 0)
    }

    /// The last requested (clamped) power level of a channel.
    pub fn power(&self, id: ChannelId) -> Result<u8, Error> {
        critical_section::with(|cs| Ok(self.channels.borrow_ref(cs).get(id)?.level()))
    }

    /// The phase delay in ticks currently in effect for a channel.
    pub fn delay(&self, id: ChannelId) -> Result<u8, Error> {
        critical_section::with(|cs| Ok(self.channels.borrow_ref(cs).get(id)?.delay()))
    }

    /// Ticks since the last zero crossing.
    pub fn now(&self, cs: CriticalSection<'_>) -> u8 {
        self.clock.now(cs)
    }

    /// Zero-cross interrupt handler.
    ///
    /// Restarts the tick count and releases all trigger outputs,
    /// so that every half-wave starts with inactive triggers.
    #[inline(always)]
    pub fn on_zero_cross(&self, cs: CriticalSection<'_>) {
        self.clock.reset(cs);
        for channel in self.channels.borrow_ref_mut(cs).iter_mut() {
            channel.release();
        }
    }

    /// Tick timer interrupt handler.
    #[inline(always)]
    pub fn on_tick(&self, cs: CriticalSection<'_>) {
        let now = self.clock.advance(cs);
        for channel in self.channels.borrow_ref_mut(cs).iter_mut() {
            channel.run(now, self.pulse);
        }
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use super::*;
    use crate::{
        error::Precondition,
        hal::TickPeriod,
        table::{PROFILE_50HZ, PROFILE_60HZ},
    };
    use embedded_hal::digital::ErrorType;
    use std::{rc::Rc, vec, vec::Vec};

    /// Shared view of a [TestPin].
    #[derive(Clone)]
    struct Probe(Rc<(Cell<bool>, Cell<u32>)>);

    impl Probe {
        fn new(high: bool) -> Self {
            Self(Rc::new((Cell::new(high), Cell::new(0))))
        }

        fn pin(&self) -> TestPin {
            TestPin(self.clone())
        }

        fn is_high(&self) -> bool {
            self.0.0.get()
        }

        /// Number of low to high transitions.
        fn pulses(&self) -> u32 {
            self.0.1.get()
        }
    }

    struct TestPin(Probe);

    impl ErrorType for TestPin {
        type Error = Infallible;
    }

    impl OutputPin for TestPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.0.0.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            let state = &self.0.0;
            if !state.0.get() {
                state.1.set(state.1.get() + 1);
            }
            state.0.set(true);
            Ok(())
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum HalCall {
        ZeroCross,
        Timer(TickPeriod),
        Irqs,
    }

    #[derive(Default)]
    struct TestHal(Vec<HalCall>);

    impl PhaseHal for TestHal {
        fn setup_zero_cross(&mut self) {
            self.0.push(HalCall::ZeroCross);
        }

        fn setup_tick_timer(&mut self, period: TickPeriod) {
            self.0.push(HalCall::Timer(period));
        }

        fn enable_interrupts(&mut self) {
            self.0.push(HalCall::Irqs);
        }
    }

    fn zero_cross<const N: usize>(d: &Dimmer<TestPin, N>) {
        critical_section::with(|cs| d.on_zero_cross(cs));
    }

    fn tick<const N: usize>(d: &Dimmer<TestPin, N>) {
        critical_section::with(|cs| d.on_tick(cs));
    }

    /// Run `ticks` ticks and record the output after each tick.
    /// Index `t` of the result is the state after tick count `t`.
    fn trace<const N: usize>(d: &Dimmer<TestPin, N>, probe: &Probe, ticks: u16) -> Vec<bool> {
        let mut states = vec![probe.is_high()];
        for _ in 0..ticks {
            tick(d);
            states.push(probe.is_high());
        }
        states
    }

    fn started<const N: usize>(probes: &[Probe]) -> (Dimmer<TestPin, N>, Vec<ChannelId>) {
        let d = Dimmer::new(PROFILE_60HZ);
        let ids = probes
            .iter()
            .map(|p| d.register(p.pin()).unwrap())
            .collect();
        d.begin(&mut TestHal::default()).unwrap();
        (d, ids)
    }

    #[test]
    fn test_register() {
        let probes = [Probe::new(true), Probe::new(true), Probe::new(false)];
        let d: Dimmer<TestPin, 3> = Dimmer::new(PROFILE_60HZ);
        assert!(d.is_empty());
        assert_eq!(d.capacity(), 3);

        for (i, probe) in probes.iter().enumerate() {
            let id = d.register(probe.pin()).unwrap();
            assert_eq!(id.index(), i);
            assert!(!probe.is_high());
            assert_eq!(d.power(id), Ok(0));
            assert_eq!(d.delay(id), Ok(PROFILE_60HZ.table.max_delay()));
        }
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn test_capacity_exceeded() {
        let d: Dimmer<TestPin, 2> = Dimmer::new(PROFILE_60HZ);
        let a = d.register(Probe::new(false).pin()).unwrap();
        let b = d.register(Probe::new(false).pin()).unwrap();

        let extra = Probe::new(true);
        assert_eq!(d.register(extra.pin()), Err(Error::CapacityExceeded));
        assert_eq!(d.register(extra.pin()), Err(Error::CapacityExceeded));
        // The rejected output is not touched.
        assert!(extra.is_high());
        assert_eq!(d.len(), 2);

        d.begin(&mut TestHal::default()).unwrap();
        assert_eq!(d.set_power(a, 100), Ok(PowerUpdate::Changed));
        assert_eq!(d.set_power(b, 20), Ok(PowerUpdate::Changed));
        assert_eq!(d.power(a), Ok(100));
        assert_eq!(d.power(b), Ok(20));
    }

    #[test]
    fn test_zero_capacity() {
        let d: Dimmer<TestPin, 0> = Dimmer::new(PROFILE_60HZ);
        assert_eq!(
            d.register(Probe::new(false).pin()),
            Err(Error::CapacityExceeded)
        );
    }

    #[test]
    fn test_begin() {
        let d: Dimmer<TestPin, 1> = Dimmer::new(PROFILE_50HZ);
        d.register(Probe::new(false).pin()).unwrap();
        assert!(!d.is_started());

        let mut hal = TestHal::default();
        d.begin(&mut hal).unwrap();
        assert!(d.is_started());
        assert_eq!(
            hal.0,
            vec![
                HalCall::ZeroCross,
                HalCall::Timer(TickPeriod {
                    tick_ns: 60_000,
                    ticks_per_halfwave: 166,
                }),
                HalCall::Irqs,
            ]
        );

        let already = Err(Error::PreconditionViolation {
            precondition: Precondition::AlreadyStarted,
        });
        let mut hal2 = TestHal::default();
        assert_eq!(d.begin(&mut hal2), already);
        assert!(hal2.0.is_empty());
        assert_eq!(d.register(Probe::new(false).pin()).map(|_| ()), already);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_set_power_before_begin() {
        let d: Dimmer<TestPin, 1> = Dimmer::new(PROFILE_60HZ);
        let id = d.register(Probe::new(false).pin()).unwrap();
        assert_eq!(
            d.set_power(id, 10),
            Err(Error::PreconditionViolation {
                precondition: Precondition::NotStarted,
            })
        );
        assert_eq!(d.off(id), Err(Error::NOT_STARTED));
        assert_eq!(d.power(id), Ok(0));
    }

    #[test]
    fn test_power_roundtrip() {
        let (d, ids) = started::<1>(&[Probe::new(false)]);
        let id = ids[0];
        let table = PROFILE_60HZ.table;
        for level in (0..=table.max_level()).rev() {
            d.set_power(id, level).unwrap();
            assert_eq!(d.power(id), Ok(level));
            assert_eq!(d.delay(id), Ok(table.delay(level)));
        }
    }

    #[test]
    fn test_power_update() {
        let (d, ids) = started::<1>(&[Probe::new(false)]);
        let id = ids[0];
        assert_eq!(d.set_power(id, 0), Ok(PowerUpdate::Unchanged));
        assert_eq!(d.set_power(id, 80), Ok(PowerUpdate::Changed));
        assert_eq!(d.set_power(id, 80), Ok(PowerUpdate::Unchanged));

        assert_eq!(d.set_power(id, 166), Ok(PowerUpdate::Clamped));
        assert_eq!(d.power(id), Ok(165));
        assert_eq!(d.delay(id), Ok(0));
        assert_eq!(d.set_power(id, 255), Ok(PowerUpdate::Clamped));
        assert_eq!(d.power(id), Ok(165));

        assert_eq!(d.off(id), Ok(PowerUpdate::Changed));
        assert_eq!(d.power(id), Ok(0));
        assert_eq!(d.delay(id), Ok(167));
    }

    #[test]
    fn test_unknown_channel() {
        let (d, _) = started::<2>(&[Probe::new(false)]);
        let foreign = ChannelId::new(1);
        assert_eq!(d.set_power(foreign, 1), Err(Error::UnknownChannel));
        assert_eq!(d.power(foreign), Err(Error::UnknownChannel));
        assert_eq!(d.delay(ChannelId::new(7)), Err(Error::UnknownChannel));
    }

    #[test]
    fn test_clock() {
        let (d, _) = started::<1>(&[Probe::new(false)]);
        for _ in 0..42 {
            tick(&d);
        }
        zero_cross(&d);
        critical_section::with(|cs| assert_eq!(d.now(cs), 0));
        for n in 1..=100 {
            tick(&d);
            critical_section::with(|cs| assert_eq!(d.now(cs), n));
        }
    }

    #[test]
    fn test_pulse_window() {
        let probe = Probe::new(false);
        let (d, ids) = started::<1>(core::slice::from_ref(&probe));
        let table = PROFILE_60HZ.table;
        let pulse = u16::from(d.pulse_width());
        let halfwave = PROFILE_60HZ.ticks_per_halfwave();

        for level in [1, 2, 40, 83, 120, 150, 164] {
            d.set_power(ids[0], level).unwrap();
            zero_cross(&d);
            let states = trace(&d, &probe, halfwave);

            let start = u16::from(table.delay(level));
            for (t, &high) in states.iter().enumerate() {
                let t = t as u16;
                let expected = t >= start && t < start + pulse;
                assert_eq!(high, expected, "level {level} tick {t}");
            }
        }
        assert_eq!(probe.pulses(), 7);
    }

    #[test]
    fn test_full_power() {
        let probe = Probe::new(false);
        let (d, ids) = started::<1>(core::slice::from_ref(&probe));
        d.set_power(ids[0], 165).unwrap();
        zero_cross(&d);
        assert!(!probe.is_high());

        // Delay 0 triggers on the first tick.
        let states = trace(&d, &probe, 166);
        let pulse = d.pulse_width() as usize;
        assert!(states[1..pulse].iter().all(|&h| h));
        assert!(states[pulse..].iter().all(|&h| !h));
        assert_eq!(probe.pulses(), 1);
    }

    #[test]
    fn test_scenario_two_channels() {
        let probes = [Probe::new(false), Probe::new(false)];
        let d: Dimmer<TestPin, 2> = Dimmer::new(PROFILE_60HZ);
        let a = d.register(probes[0].pin()).unwrap();
        let b = d.register(probes[1].pin()).unwrap();
        d.begin(&mut TestHal::default()).unwrap();
        d.set_power(a, 165).unwrap();
        d.set_power(b, 0).unwrap();

        zero_cross(&d);
        let pulse = d.pulse_width();
        for t in 1..=166u8 {
            tick(&d);
            assert_eq!(probes[0].is_high(), t < pulse, "tick {t}");
            assert!(!probes[1].is_high(), "tick {t}");
        }
        assert_eq!(probes[0].pulses(), 1);
        assert_eq!(probes[1].pulses(), 0);
    }

    #[test]
    fn test_independent_channels() {
        let probes = [Probe::new(false), Probe::new(false), Probe::new(false)];
        let (d, ids) = started::<3>(&probes);
        let levels = [30, 100, 158];
        for (&id, &level) in ids.iter().zip(levels.iter()) {
            d.set_power(id, level).unwrap();
        }

        zero_cross(&d);
        let pulse = u16::from(d.pulse_width());
        for t in 1..=166u16 {
            tick(&d);
            for (i, &level) in levels.iter().enumerate() {
                let start = u16::from(PROFILE_60HZ.table.delay(level));
                let expected = t >= start && t < start + pulse;
                assert_eq!(probes[i].is_high(), expected, "channel {i} tick {t}");
            }
        }
        for probe in &probes {
            assert_eq!(probe.pulses(), 1);
        }
    }

    #[test]
    fn test_level_zero_never_fires() {
        let probe = Probe::new(false);
        let (d, _) = started::<1>(core::slice::from_ref(&probe));

        // A long half-wave (low mains frequency) runs past the
        // boundary delay of level 0.
        zero_cross(&d);
        trace(&d, &probe, 400);
        assert_eq!(probe.pulses(), 0);
    }

    #[test]
    fn test_missing_zero_cross() {
        let probe = Probe::new(false);
        let (d, ids) = started::<1>(core::slice::from_ref(&probe));
        d.set_power(ids[0], 100).unwrap();

        zero_cross(&d);
        let states = trace(&d, &probe, 1000);
        assert_eq!(probe.pulses(), 1);
        assert!(!states[1000]);
        critical_section::with(|cs| assert_eq!(d.now(cs), u8::MAX));
    }

    #[test]
    fn test_zero_cross_releases_trigger() {
        let probe = Probe::new(false);
        let (d, ids) = started::<1>(core::slice::from_ref(&probe));
        d.set_power(ids[0], 1).unwrap();
        assert_eq!(d.delay(ids[0]), Ok(146));

        // Short half-wave: the zero crossing arrives inside the pulse.
        zero_cross(&d);
        trace(&d, &probe, 150);
        assert!(probe.is_high());
        zero_cross(&d);
        assert!(!probe.is_high());

        let states = trace(&d, &probe, 145);
        assert!(states.iter().all(|&h| !h));
    }

    #[test]
    fn test_set_power_mid_halfwave() {
        let probe = Probe::new(false);
        let (d, ids) = started::<1>(core::slice::from_ref(&probe));
        d.set_power(ids[0], 10).unwrap();
        let delay = d.delay(ids[0]).unwrap();
        assert_eq!(delay, 140);

        zero_cross(&d);
        trace(&d, &probe, 50);
        assert!(!probe.is_high());

        // A trigger point that has already passed fires on the next tick.
        d.set_power(ids[0], 152).unwrap();
        assert_eq!(d.delay(ids[0]), Ok(47));
        tick(&d);
        assert!(probe.is_high());
    }

    #[test]
    fn test_custom_pulse_width() {
        let probe = Probe::new(false);
        let d: Dimmer<TestPin, 1> = Dimmer::with_pulse_width(PROFILE_60HZ, 3);
        let id = d.register(probe.pin()).unwrap();
        d.begin(&mut TestHal::default()).unwrap();
        d.set_power(id, 83).unwrap();
        let start = usize::from(d.delay(id).unwrap());

        zero_cross(&d);
        let states = trace(&d, &probe, 166);
        let high: Vec<usize> = (0..states.len()).filter(|&t| states[t]).collect();
        assert_eq!(high, vec![start, start + 1, start + 2]);
    }
}

// vim: ts=4 sw=4 expandtab
