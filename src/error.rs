// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use derive_more::Display;

/// API ordering rule that was broken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Precondition {
    /// The operation requires [crate::Dimmer::begin] to have run.
    #[display("dimmer not started")]
    NotStarted,
    /// The operation is only allowed before [crate::Dimmer::begin].
    #[display("dimmer already started")]
    AlreadyStarted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// All channel slots are in use.
    #[display("channel capacity exceeded")]
    CapacityExceeded,
    /// The channel id was not issued by this dimmer.
    #[display("unknown channel")]
    UnknownChannel,
    #[display("precondition violation: {precondition}")]
    PreconditionViolation { precondition: Precondition },
}

impl Error {
    pub(crate) const NOT_STARTED: Self = Self::PreconditionViolation {
        precondition: Precondition::NotStarted,
    };
    pub(crate) const ALREADY_STARTED: Self = Self::PreconditionViolation {
        precondition: Precondition::AlreadyStarted,
    };
}

impl core::error::Error for Error {}


// vim: ts=4 sw=4 expandtab
