// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Power level to phase delay calibration.
//!
//! A calibration table belongs to exactly one timing configuration:
//! the tick period and the mains frequency together determine how many
//! ticks fit into one mains half-wave. [Profile] bundles the three.

use crate::hal::TickPeriod;

/// Phase delay in ticks, indexed by power level.
///
/// One tick is 1/166.67 of a mains half-wave (50 us at 60 Hz, 60 us at 50 Hz).
/// The delays follow the integral of the sine half-wave,
/// so the power steps are roughly linear in delivered power.
/// Entry 0 lies behind the end of the half-wave.
#[rustfmt::skip]
pub const POWER_TO_DELAY: [u8; 166] = [
    167, 146, 145, 145, 144, 143, 143, 142, 141, 141,
    140, 139, 139, 138, 137, 137, 136, 136, 135, 134,
    134, 133, 133, 132, 131, 131, 130, 130, 129, 129,
    128, 128, 127, 126, 126, 125, 125, 124, 124, 123,
    123, 122, 121, 121, 120, 120, 119, 119, 118, 118,
    117, 117, 116, 116, 115, 114, 114, 113, 113, 112,
    112, 111, 111, 110, 110, 109, 109, 108, 107, 107,
    106, 106, 105, 105, 104, 104, 103, 103, 102, 101,
    101, 100, 100,  99,  99,  98,  98,  97,  96,  96,
     95,  95,  94,  94,  93,  92,  92,  91,  91,  90,
     90,  89,  88,  88,  87,  86,  86,  85,  85,  84,
     83,  83,  82,  81,  81,  80,  79,  79,  78,  77,
     77,  76,  75,  75,  74,  73,  72,  72,  71,  70,
     69,  68,  68,  67,  66,  65,  64,  64,  63,  62,
     61,  60,  59,  58,  57,  56,  55,  54,  53,  51,
     50,  49,  47,  46,  45,  43,  41,  40,  38,  36,
     33,  31,  27,  23,  18,   0,
];

/// Trigger pulse width in ticks.
///
/// Long enough to cover the propagation delay of an opto-triac driver
/// and to latch the triac at low load current.
pub const TRIGGER_PULSE_TICKS: u8 = 18;

pub(crate) const NS_PER_SEC: u64 = 1_000_000_000;

/// Immutable power level to phase delay mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationTable(&'static [u8]);

impl CalibrationTable {
    /// Wrap a table of phase delays.
    ///
    /// The table must not be empty, must not have more than 256 entries,
    /// entry 0 must be the largest delay and the last entry must be 0.
    /// Violations panic, which is a compile error if called in a `const` item.
    pub const fn new(delays: &'static [u8]) -> Self {
        assert!(!delays.is_empty(), "Calibration table is empty.");
        assert!(delays.len() <= 256, "Calibration table is too long.");
        assert!(delays[delays.len() - 1] == 0, "Last calibration entry is not 0.");
        let mut i = 1;
        while i < delays.len() {
            assert!(delays[i] <= delays[0], "Calibration entry 0 is not the maximum.");
            i += 1;
        }
        Self(delays)
    }

    /// The highest power level (P_MAX).
    #[inline]
    pub const fn max_level(&self) -> u8 {
        (self.0.len() - 1) as u8
    }

    /// The delay of power level 0.
    #[inline]
    pub const fn max_delay(&self) -> u8 {
        self.0[0]
    }

    /// Clamp a power level into `0..=max_level()`.
    #[inline]
    pub const fn clamp(&self, level: u8) -> u8 {
        if level > self.max_level() {
            self.max_level()
        } else {
            level
        }
    }

    /// Phase delay in ticks for a power level.
    ///
    /// Levels above `max_level()` are clamped.
    #[inline]
    pub const fn delay(&self, level: u8) -> u8 {
        self.0[self.clamp(level) as usize]
    }

    /// Check whether higher power levels never have longer delays.
    pub const fn is_monotonic(&self) -> bool {
        let mut i = 1;
        while i < self.0.len() {
            if self.0[i] > self.0[i - 1] {
                return false;
            }
            i += 1;
        }
        true
    }

    pub const fn as_slice(&self) -> &'static [u8] {
        self.0
    }
}

/// Timing configuration: mains frequency, tick period and matching table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Profile {
    /// Mains frequency in Hz.
    pub mains_hz: u8,
    /// Tick period in nanoseconds.
    pub tick_ns: u32,
    /// Calibration for exactly this tick period and mains frequency.
    pub table: CalibrationTable,
}

/// 60 Hz mains, 50 us tick.
pub const PROFILE_60HZ: Profile = Profile {
    mains_hz: 60,
    tick_ns: 50_000,
    table: CalibrationTable::new(&POWER_TO_DELAY),
};

/// 50 Hz mains, 60 us tick.
///
/// The tick is stretched by the same factor as the mains period,
/// so the 60 Hz table applies unchanged.
pub const PROFILE_50HZ: Profile = Profile {
    mains_hz: 50,
    tick_ns: 60_000,
    table: CalibrationTable::new(&POWER_TO_DELAY),
};

/// The profile selected by the `mains-60hz` / `mains-50hz` features.
#[cfg(feature = "mains-60hz")]
pub const DEFAULT_PROFILE: Profile = PROFILE_60HZ;
/// The profile selected by the `mains-60hz` / `mains-50hz` features.
#[cfg(all(feature = "mains-50hz", not(feature = "mains-60hz")))]
pub const DEFAULT_PROFILE: Profile = PROFILE_50HZ;

impl Profile {
    /// Length of one mains half-wave in nanoseconds.
    pub const fn halfwave_ns(&self) -> u32 {
        (NS_PER_SEC / (2 * self.mains_hz as u64)) as u32
    }

    /// Number of whole ticks in one mains half-wave.
    pub const fn ticks_per_halfwave(&self) -> u16 {
        (self.halfwave_ns() / self.tick_ns) as u16
    }

    pub const fn tick_period(&self) -> TickPeriod {
        TickPeriod {
            tick_ns: self.tick_ns,
            ticks_per_halfwave: self.ticks_per_halfwave(),
        }
    }

    /// Compare match value for a CTC mode timer running at `timer_clock_hz`.
    pub const fn timer_compare(&self, timer_clock_hz: u32) -> u16 {
        self.tick_period().timer_compare(timer_clock_hz)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_table_boundaries() {
        let table = PROFILE_60HZ.table;
        assert_eq!(table.max_level(), 165);
        assert_eq!(table.delay(165), 0);
        assert_eq!(table.delay(0), table.max_delay());
        assert!(table.as_slice().iter().all(|&d| d <= table.delay(0)));
        assert!(table.is_monotonic());
    }

    #[test]
    fn test_delay_clamps() {
        let table = PROFILE_60HZ.table;
        assert_eq!(table.clamp(166), 165);
        assert_eq!(table.clamp(255), 165);
        assert_eq!(table.clamp(42), 42);
        assert_eq!(table.delay(200), 0);
        assert_eq!(table.delay(1), 146);
    }

    #[test]
    fn test_non_monotonic() {
        static BUMPY: [u8; 4] = [10, 3, 5, 0];
        let table = CalibrationTable::new(&BUMPY);
        assert!(!table.is_monotonic());
        assert_eq!(table.max_level(), 3);
    }

    #[test]
    #[should_panic]
    fn test_last_entry_not_zero() {
        static BAD: [u8; 3] = [10, 5, 1];
        CalibrationTable::new(&BAD);
    }

    #[test]
    #[should_panic]
    fn test_first_entry_not_max() {
        static BAD: [u8; 3] = [5, 10, 0];
        CalibrationTable::new(&BAD);
    }

    #[test]
    fn test_profiles() {
        assert_eq!(PROFILE_60HZ.ticks_per_halfwave(), 166);
        assert_eq!(PROFILE_50HZ.ticks_per_halfwave(), 166);
        assert_eq!(PROFILE_60HZ.halfwave_ns(), 8_333_333);
        assert_eq!(PROFILE_50HZ.halfwave_ns(), 10_000_000);

        // Power level 0 lies entirely behind the half-wave.
        for p in [PROFILE_60HZ, PROFILE_50HZ] {
            assert!(u16::from(p.table.max_delay()) > p.ticks_per_halfwave());
        }
    }

    #[test]
    fn test_timer_compare() {
        // 16 MHz, prescaler 8: compare value = 100 * 60 / f - 1
        assert_eq!(PROFILE_60HZ.timer_compare(2_000_000), 99);
        assert_eq!(PROFILE_50HZ.timer_compare(2_000_000), 119);
        assert_eq!(PROFILE_60HZ.timer_compare(16_000_000), 799);
        assert_eq!(PROFILE_60HZ.timer_compare(0), 0);
    }

    #[test]
    fn test_tick_period() {
        let period = PROFILE_50HZ.tick_period();
        assert_eq!(period.tick_ns, 60_000);
        assert_eq!(period.ticks_per_halfwave, 166);

        #[cfg(feature = "mains-60hz")]
        assert_eq!(DEFAULT_PROFILE, PROFILE_60HZ);
        #[cfg(not(feature = "mains-60hz"))]
        assert_eq!(DEFAULT_PROFILE, PROFILE_50HZ);
    }
}

// vim: ts=4 sw=4 expandtab
