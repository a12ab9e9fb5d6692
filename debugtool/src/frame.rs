// -*- coding: utf-8 -*-

//! Telemetry frame decoder.
//!
//! The firmware streams `[id, lo, hi]` frames for all slots in id order,
//! followed by a `[0xFF, 0xFF, 0xFF]` sync frame.

use std::fmt;

const SYNC_ID: u8 = 0xFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Slot {
    Power0,
    Power1,
    ZeroCross,
    Setpoint0,
    Setpoint1,
    RegisterFailed,
}

impl Slot {
    pub const ALL: [Slot; 6] = [
        Slot::Power0,
        Slot::Power1,
        Slot::ZeroCross,
        Slot::Setpoint0,
        Slot::Setpoint1,
        Slot::RegisterFailed,
    ];

    pub fn from_id(id: u8) -> Option<Slot> {
        Self::ALL.get(id as usize).copied()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::Power0 => "power0",
            Slot::Power1 => "power1",
            Slot::ZeroCross => "zerocross",
            Slot::Setpoint0 => "setpoint0",
            Slot::Setpoint1 => "setpoint1",
            Slot::RegisterFailed => "regfail",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    Value { slot: Slot, value: u16 },
    /// End of one round of all slots.
    Sync,
}

#[derive(Default)]
pub struct Decoder {
    hist: [u8; 4],
    synced: bool,
    buf: [u8; 3],
    pos: usize,
    expect: u8,
}

impl Decoder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    fn lose_sync(&mut self) {
        self.synced = false;
        self.hist = [0; 4];
        self.pos = 0;
    }

    /// Feed one received byte.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        if !self.synced {
            self.hist.rotate_left(1);
            self.hist[3] = byte;
            if self.hist == [SYNC_ID, SYNC_ID, SYNC_ID, 0] {
                // The trailing 0 is the id of the first slot.
                self.synced = true;
                self.buf[0] = 0;
                self.pos = 1;
                self.expect = 0;
                return Some(Frame::Sync);
            }
            return None;
        }

        self.buf[self.pos] = byte;
        self.pos += 1;
        if self.pos < self.buf.len() {
            return None;
        }
        self.pos = 0;

        let [id, lo, hi] = self.buf;
        let value = u16::from_le_bytes([lo, hi]);

        if self.expect as usize == Slot::ALL.len() {
            if id == SYNC_ID && value == 0xFFFF {
                self.expect = 0;
                return Some(Frame::Sync);
            }
        } else if id == self.expect {
            if let Some(slot) = Slot::from_id(id) {
                self.expect += 1;
                return Some(Frame::Value { slot, value });
            }
        }

        self.lose_sync();
        None
    }
}


// vim: ts=4 sw=4 expandtab
