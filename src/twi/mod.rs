// Licensed under the Apache-2.0 license

//! AVR TWI (two-wire interface) master driver module.
//!
//! This module provides a polled master-mode driver for the AVR TWI
//! peripheral, designed for bare-metal and `no_std` environments. The
//! register-facing code is isolated behind the [`TwiHardware`] trait so the
//! transaction engine can be exercised against a software fake on the host.

pub mod common;
pub mod traits;
pub mod twi_controller;

#[cfg(feature = "atmega328p")]
pub mod atmega328p;

pub use common::{
    BusStatus, Direction, RetryBudget, StartOutcome, TransferError, TwiConfig, TwiConfigBuilder,
    WriteOutcome,
};
pub use traits::TwiHardware;
pub use twi_controller::TwiController;

#[cfg(feature = "atmega328p")]
pub use atmega328p::Atmega328pTwi;
