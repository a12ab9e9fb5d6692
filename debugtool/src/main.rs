// -*- coding: utf-8 -*-

#![forbid(unsafe_code)]

mod frame;
mod serial;

use crate::{
    frame::{Frame, Slot},
    serial::run_serial,
};
use anyhow as ah;
use clap::Parser;
use std::{sync::mpsc, thread, time::Duration};

/// Show the telemetry of the triacdim firmware.
#[derive(Parser, Debug)]
struct Opts {
    /// Serial port device.
    #[arg(default_value = "/dev/ttyUSB0")]
    port: String,

    /// Serial baud rate.
    #[arg(short, long, default_value_t = 19_200)]
    baud: u32,
}

fn print_round(values: &[Option<u16>]) {
    let line: Vec<String> = Slot::ALL
        .iter()
        .zip(values)
        .map(|(slot, value)| match value {
            Some(value) => format!("{slot}={value}"),
            None => format!("{slot}=?"),
        })
        .collect();
    println!("{}", line.join(" "));
}

fn main() -> ah::Result<()> {
    let opts = Opts::parse();

    let (ser_notify_tx, ser_notify_rx) = mpsc::channel();

    thread::scope(|s| {
        s.spawn(|| {
            loop {
                if let Err(e) = run_serial(&opts.port, opts.baud, &ser_notify_tx) {
                    eprintln!("Serial error: {e:?}");
                }
                thread::sleep(Duration::from_millis(5000));
            }
        });

        let mut values = [None; Slot::ALL.len()];
        for frame in ser_notify_rx.iter() {
            match frame {
                Frame::Value { slot, value } => values[slot as usize] = Some(value),
                Frame::Sync => {
                    if values.iter().any(Option::is_some) {
                        print_round(&values);
                    }
                    values = [None; Slot::ALL.len()];
                }
            }
        }
    });
    Ok(())
}

// vim: ts=4 sw=4 expandtab
