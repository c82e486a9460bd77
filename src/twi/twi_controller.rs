// Licensed under the Apache-2.0 license

//! High-level TWI transaction engine.
//!
//! This module composes the blocking bus primitives of [`TwiHardware`] into
//! register read and register write transactions, applying a bounded retry
//! policy around the start/addressing handshake so a busy or absent slave
//! cannot hang the caller indefinitely.

use crate::common::{Logger, NoOpLogger};
use crate::twi::common::{
    Direction, RetryBudget, StartOutcome, TransferError, TwiConfig, WriteOutcome,
};
use crate::twi::traits::TwiHardware;

pub struct TwiController<H: TwiHardware, L: Logger = NoOpLogger> {
    pub hardware: H,
    pub config: TwiConfig,
    pub logger: L,
}

/// Scoped ownership of the bus for one transaction.
///
/// Dropping the guard asserts a stop condition, so every exit path out of a
/// transaction, success or abort, releases the bus exactly once.
struct BusGuard<'a, H: TwiHardware> {
    hardware: &'a mut H,
}

impl<'a, H: TwiHardware> BusGuard<'a, H> {
    fn new(hardware: &'a mut H) -> Self {
        Self { hardware }
    }

    fn hw(&mut self) -> &mut H {
        self.hardware
    }
}

impl<H: TwiHardware> Drop for BusGuard<'_, H> {
    fn drop(&mut self) {
        self.hardware.stop();
    }
}

/// Establish the start condition and gain address acknowledgment.
///
/// Start contention and address rejection share one retry budget. A rejected
/// address re-enters the loop at the start step, so the retry is a repeated
/// start of the whole handshake rather than a stop/start cycle; a busy slave
/// only needs the master to retry addressing without releasing the bus.
fn acquire<H: TwiHardware>(
    bus: &mut BusGuard<'_, H>,
    address: u8,
    budget: &mut RetryBudget,
) -> Result<(), TransferError> {
    loop {
        if let StartOutcome::Collision = bus.hw().start() {
            if !budget.consume() {
                return Err(TransferError::StartExhausted);
            }
            continue;
        }

        match bus.hw().write_byte(Direction::Write.address_byte(address)) {
            WriteOutcome::Acked => return Ok(()),
            WriteOutcome::Nacked | WriteOutcome::Unexpected => {
                if !budget.consume() {
                    return Err(TransferError::AddressExhausted);
                }
            }
        }
    }
}

fn read_on_bus<H: TwiHardware>(
    bus: &mut BusGuard<'_, H>,
    address: u8,
    register: u8,
    buf: &mut [u8],
    budget: &mut RetryBudget,
) -> Result<(), TransferError> {
    acquire(bus, address, budget)?;

    if bus.hw().write_byte(register) != WriteOutcome::Acked {
        return Err(TransferError::OffsetRejected);
    }

    // Repeated start to switch the transfer direction
    if let StartOutcome::Collision = bus.hw().start() {
        return Err(TransferError::RepeatedStartRejected);
    }

    if bus.hw().write_byte(Direction::Read.address_byte(address)) != WriteOutcome::Acked {
        return Err(TransferError::ReadAddressRejected);
    }

    if let Some((last, rest)) = buf.split_last_mut() {
        for byte in rest {
            *byte = bus.hw().read_byte_ack();
        }
        *last = bus.hw().read_byte_nack();
    }

    Ok(())
}

fn write_on_bus<H: TwiHardware>(
    bus: &mut BusGuard<'_, H>,
    address: u8,
    register: u8,
    bytes: &[u8],
    budget: &mut RetryBudget,
) -> Result<(), TransferError> {
    acquire(bus, address, budget)?;

    if bus.hw().write_byte(register) != WriteOutcome::Acked {
        return Err(TransferError::OffsetRejected);
    }

    for &byte in bytes {
        if bus.hw().write_byte(byte) != WriteOutcome::Acked {
            return Err(TransferError::DataRejected);
        }
    }

    Ok(())
}

impl<H: TwiHardware, L: Logger> TwiController<H, L> {
    pub fn new(hardware: H, config: TwiConfig, logger: L) -> Self {
        Self {
            hardware,
            config,
            logger,
        }
    }

    /// Program the clock divider and enable the peripheral.
    ///
    /// Must run once before the first transaction. Returns the programmed
    /// divider value; equal configurations always yield equal dividers.
    pub fn configure(&mut self) -> u8 {
        self.hardware.configure(&self.config)
    }

    /// Read `buf.len()` bytes from `register` of the slave at `address`.
    ///
    /// An empty buffer succeeds trivially without touching the bus. On any
    /// abort the bus is released with a stop condition before returning.
    pub fn read_register(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), TransferError> {
        if buf.is_empty() {
            return Ok(());
        }

        let Self {
            hardware,
            config,
            logger,
        } = self;
        let mut budget = RetryBudget::new(config.retry_limit);
        let result = {
            let mut bus = BusGuard::new(hardware);
            read_on_bus(&mut bus, address, register, buf, &mut budget)
        };
        if let Err(err) = result {
            logger.log(err.description());
        }
        result
    }

    /// Write `bytes` to `register` of the slave at `address`.
    ///
    /// An empty slice succeeds trivially without touching the bus. On any
    /// abort the bus is released with a stop condition before returning.
    pub fn write_register(
        &mut self,
        address: u8,
        register: u8,
        bytes: &[u8],
    ) -> Result<(), TransferError> {
        if bytes.is_empty() {
            return Ok(());
        }

        let Self {
            hardware,
            config,
            logger,
        } = self;
        let mut budget = RetryBudget::new(config.retry_limit);
        let result = {
            let mut bus = BusGuard::new(hardware);
            write_on_bus(&mut bus, address, register, bytes, &mut budget)
        };
        if let Err(err) = result {
            logger.log(err.description());
        }
        result
    }
}
