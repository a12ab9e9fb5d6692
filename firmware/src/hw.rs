pub use atmega::{self as mcu, Peripherals};
pub use avr_device::atmega328p as atmega;
pub use avr_device::interrupt;

use crate::mutex::IrqCtx;

/// CPU clock frequency.
pub const F_CPU: u32 = 16_000_000;

macro_rules! define_isr {
    ($name:ident, $handler:path) => {
        #[avr_device::interrupt(atmega328p)]
        fn $name() {
            // SAFETY: We are inside of an interrupt handler.
            // Therefore, it is safe to construct an `IrqCtx`.
            let c = unsafe { IrqCtx::new() };
            $handler(&c);
        }
    };
}

// Interrupts don't nest. The zero-cross and the tick handler
// never preempt each other.
define_isr!(INT0, crate::exint::irq_handler_int0);
define_isr!(TIMER2_COMPA, crate::timer::irq_handler_timer2_compa);
#[cfg(feature = "debug")]
define_isr!(USART_TX, crate::uart::irq_handler_usart_tx);

// vim: ts=4 sw=4 expandtab
