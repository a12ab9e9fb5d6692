// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]
#![feature(asm_experimental_arch)]

mod analog;
mod debug;
mod exint;
mod filter;
mod hw;
mod mutex;
mod ports;
mod system;
mod timer;
#[cfg(feature = "debug")]
mod uart;

use crate::{
    exint::{EXINT, ExInt},
    hw::{Peripherals, interrupt, mcu},
    mutex::{MainCtx, MainInitCtx, unwrap_option},
    ports::{PORTB, PORTC, PORTD, PortB, PortC, PortD, ports_setup},
    system::{SysPeriph, System},
};

static SYSTEM: System = System::new();

fn wdt_init() {
    // SAFETY: The asm code only accesses the WDT registers
    //         which are not accessed from anywhere else in the program.
    unsafe {
        // Enable WDT with timeout 32 ms
        core::arch::asm!(
            "wdr",
            "ldi {tmp}, 0x18", // WDCE=1, WDE=1
            "sts {WDTCSR}, {tmp}",
            "ldi {tmp}, 0x09", // WDCE=0, WDE=1, WDP3..0=0001
            "sts {WDTCSR}, {tmp}",
            tmp = out(reg_upper) _,
            WDTCSR = const 0x60,
            options(nostack, preserves_flags)
        );
    }
}

fn wdt_poke(_wp: &mcu::WDT) {
    avr_device::asm::wdr();
}

#[avr_device::entry]
fn main() -> ! {
    wdt_init();

    let dp = unwrap_option(Peripherals::take());

    let sp = SysPeriph { ADC: dp.ADC };

    let init_static_vars = |c: &MainInitCtx| {
        PORTB.init(c, PortB { PORTB: dp.PORTB });
        PORTC.init(c, PortC { PORTC: dp.PORTC });
        PORTD.init(c, PortD { PORTD: dp.PORTD });
        ports_setup(c);

        EXINT.init(c, ExInt { EXINT: dp.EXINT });
        timer::DP.init(c, timer::Dp { TC2: dp.TC2 });

        #[cfg(feature = "debug")]
        {
            uart::DP.init(c, uart::Dp { USART0: dp.USART0 });
            uart::DP.setup(c);
        }
    };

    // SAFETY:
    // This is the context handle for the main() function.
    // Holding a reference to this object proves that the holder
    // is running in main() context.
    let m = unsafe { MainCtx::new_with_init(init_static_vars) };

    SYSTEM.init(&m, &sp);

    // SAFETY: This must be after construction of MainCtx
    //         and after initialization of static MainInit variables.
    unsafe { interrupt::enable() };

    #[cfg(feature = "debug")]
    debug::debug_init(&m);

    loop {
        SYSTEM.run(&m, &sp);
        wdt_poke(&dp.WDT);
    }
}

// vim: ts=4 sw=4 expandtab
