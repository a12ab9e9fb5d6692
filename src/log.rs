// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Forward a diagnostic message to `defmt`, if the `defmt` feature is enabled.
///
/// Without the feature the arguments are type checked, but never evaluated.
/// Must never be used from interrupt handlers.
macro_rules! log {
    ($level:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        defmt::$level!($fmt $(, $arg)*);
        #[cfg(not(feature = "defmt"))]
        if false {
            $( let _ = &$arg; )*
        }
    }};
}

// vim: ts=4 sw=4 expandtab
