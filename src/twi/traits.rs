// Licensed under the Apache-2.0 license

//! Hardware abstraction trait for the TWI driver.
//!
//! The transaction engine talks to the bus exclusively through
//! [`TwiHardware`], which exposes the four atomic bus signals as blocking
//! primitives. Keeping the register access behind this seam lets the engine
//! run against a software fake on the host and leaves room to add a bounded
//! wait in a future revision.

use crate::twi::common::{StartOutcome, TwiConfig, WriteOutcome};

/// Blocking master-mode bus primitives.
///
/// Every primitive spins until the hardware reports completion; none of them
/// time out. The classification of the hardware status code into an outcome
/// happens inside the implementation so callers never see raw register
/// values.
pub trait TwiHardware {
    /// Program the clock divider for the configured bus clock, clear any
    /// stale prescaler state, and enable the peripheral. Returns the
    /// programmed divider value.
    ///
    /// Must be called once before the first transaction. Calling it while a
    /// transaction is in flight is undefined. Repeating it with the same
    /// configuration programs the same divider.
    fn configure(&mut self, config: &TwiConfig) -> u8;

    /// Assert a start condition (fresh or repeated) and block until the
    /// hardware completes the assertion.
    fn start(&mut self) -> StartOutcome;

    /// Assert a stop condition and block until the bus is released.
    ///
    /// Assumed to always succeed on correctly functioning hardware.
    fn stop(&mut self);

    /// Place one byte on the bus and block until transmission completes.
    fn write_byte(&mut self, byte: u8) -> WriteOutcome;

    /// Receive one byte and drive an acknowledge afterward, telling the
    /// slave more bytes are wanted. Used for every byte of a read except
    /// the last.
    fn read_byte_ack(&mut self) -> u8;

    /// Receive one byte and withhold the acknowledge, telling the slave
    /// this is the last byte. Used exactly once, for the final byte of a
    /// read.
    fn read_byte_nack(&mut self) -> u8;
}
