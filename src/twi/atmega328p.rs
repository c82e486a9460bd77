// Licensed under the Apache-2.0 license

//! ATmega328P TWI hardware implementation.
//!
//! Drives the TWI register set (TWBR/TWSR/TWDR/TWCR) through the
//! `avr-device` PAC, implementing the [`TwiHardware`] primitives by writing
//! a control word and spinning on the TWINT flag until the hardware reports
//! completion. Pin direction and pull-up configuration are external setup
//! and not handled here.
//!
//! All primitives poll with no timeout: a fault that never raises TWINT
//! stalls the caller. The retry policy bounding address acquisition lives a
//! layer up, in the transaction engine.

use avr_device::atmega328p::TWI;

use crate::common::{Logger, NoOpLogger};
use crate::twi::common::{BusStatus, StartOutcome, TwiConfig, WriteOutcome};
use crate::twi::traits::TwiHardware;

pub struct Atmega328pTwi<L: Logger = NoOpLogger> {
    twi: TWI,
    logger: L,
}

impl<L: Logger> Atmega328pTwi<L> {
    pub fn new(twi: TWI, logger: L) -> Self {
        Self { twi, logger }
    }

    /// Release the TWI peripheral.
    pub fn free(self) -> TWI {
        self.twi
    }

    /// Spin until the hardware raises TWINT for the operation in flight.
    fn wait_ready(&self) {
        while self.twi.twcr().read().twint().bit_is_clear() {}
    }

    /// Classify the status register. Valid once per completed operation.
    fn status(&self) -> Option<BusStatus> {
        BusStatus::from_raw(self.twi.twsr().read().bits())
    }
}

impl<L: Logger> TwiHardware for Atmega328pTwi<L> {
    fn configure(&mut self, config: &TwiConfig) -> u8 {
        let divider = config.bit_rate_divider();
        // Clear the prescaler bits so the divider formula holds
        self.twi.twsr().write(|w| unsafe { w.bits(0) });
        self.twi.twbr().write(|w| unsafe { w.bits(divider) });
        self.twi.twcr().write(|w| w.twen().set_bit());
        divider
    }

    fn start(&mut self) -> StartOutcome {
        self.twi
            .twcr()
            .write(|w| w.twint().set_bit().twsta().set_bit().twen().set_bit());
        self.wait_ready();
        StartOutcome::classify(self.status())
    }

    fn stop(&mut self) {
        self.twi
            .twcr()
            .write(|w| w.twint().set_bit().twsto().set_bit().twen().set_bit());
        // TWSTO clears once the stop condition has been applied to the bus
        while self.twi.twcr().read().twsto().bit_is_set() {}
    }

    fn write_byte(&mut self, byte: u8) -> WriteOutcome {
        self.twi.twdr().write(|w| unsafe { w.bits(byte) });
        self.twi
            .twcr()
            .write(|w| w.twint().set_bit().twen().set_bit());
        self.wait_ready();
        let outcome = WriteOutcome::classify(self.status());
        if outcome == WriteOutcome::Unexpected {
            self.logger.log("twi: unexpected status after byte write");
        }
        outcome
    }

    fn read_byte_ack(&mut self) -> u8 {
        // TWEA drives the acknowledge after the byte is received
        self.twi
            .twcr()
            .write(|w| w.twint().set_bit().twea().set_bit().twen().set_bit());
        self.wait_ready();
        self.twi.twdr().read().bits()
    }

    fn read_byte_nack(&mut self) -> u8 {
        self.twi
            .twcr()
            .write(|w| w.twint().set_bit().twen().set_bit());
        self.wait_ready();
        self.twi.twdr().read().bits()
    }
}
