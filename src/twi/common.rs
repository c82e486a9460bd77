// Licensed under the Apache-2.0 license

//! Common types and constants for the TWI driver.
//!
//! This module provides shared definitions for bus status classification,
//! error handling, retry accounting, and clock configuration used across the
//! TWI driver implementation.

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use fugit::HertzU32;

/// Transfer direction encoded into bit 0 of the address byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

impl Direction {
    /// Combine a 7-bit slave address with the direction bit into the
    /// address byte placed on the bus.
    #[must_use]
    pub fn address_byte(self, address: u8) -> u8 {
        (address << 1) | self as u8
    }
}

/// Status code reported by the TWI hardware after a completed bus operation.
///
/// The raw status register value is masked with [`BusStatus::MASK`] before
/// classification; the low bits carry the prescaler and are not part of the
/// status. Exactly one status is valid per completed primitive. Reading it
/// again without issuing a new primitive is undefined.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BusStatus {
    BusError = 0x00,
    StartTransmitted = 0x08,
    RepeatedStartTransmitted = 0x10,
    AddressWriteAcked = 0x18,
    AddressWriteNacked = 0x20,
    DataWriteAcked = 0x28,
    DataWriteNacked = 0x30,
    ArbitrationLost = 0x38,
    AddressReadAcked = 0x40,
    AddressReadNacked = 0x48,
    DataReadAcked = 0x50,
    DataReadNacked = 0x58,
    NoInformation = 0xF8,
}

impl BusStatus {
    /// Mask isolating the status bits of the raw status register value.
    pub const MASK: u8 = 0xF8;

    /// Classify a raw status register value. Returns `None` for values the
    /// master-mode protocol never produces.
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw & Self::MASK {
            0x00 => Some(Self::BusError),
            0x08 => Some(Self::StartTransmitted),
            0x10 => Some(Self::RepeatedStartTransmitted),
            0x18 => Some(Self::AddressWriteAcked),
            0x20 => Some(Self::AddressWriteNacked),
            0x28 => Some(Self::DataWriteAcked),
            0x30 => Some(Self::DataWriteNacked),
            0x38 => Some(Self::ArbitrationLost),
            0x40 => Some(Self::AddressReadAcked),
            0x48 => Some(Self::AddressReadNacked),
            0x50 => Some(Self::DataReadAcked),
            0x58 => Some(Self::DataReadNacked),
            0xF8 => Some(Self::NoInformation),
            _ => None,
        }
    }
}

/// Result of asserting a start condition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// Fresh or repeated start accepted; the master owns the bus.
    Accepted,
    /// Another master is driving the bus.
    Collision,
}

impl StartOutcome {
    /// Classify the status observed after a start condition.
    #[must_use]
    pub fn classify(status: Option<BusStatus>) -> Self {
        match status {
            Some(BusStatus::StartTransmitted | BusStatus::RepeatedStartTransmitted) => {
                Self::Accepted
            }
            _ => Self::Collision,
        }
    }
}

/// Result of transmitting one byte (address or data).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The receiver acknowledged the byte.
    Acked,
    /// The receiver rejected the byte, arbitration was lost, or a bus fault
    /// occurred.
    Nacked,
    /// A status outside the known-good and known-bad sets. Total failure,
    /// distinct from a plain NACK.
    Unexpected,
}

impl WriteOutcome {
    /// Classify the status observed after a byte transmission.
    #[must_use]
    pub fn classify(status: Option<BusStatus>) -> Self {
        match status {
            Some(
                BusStatus::AddressWriteAcked
                | BusStatus::DataWriteAcked
                | BusStatus::AddressReadAcked
                | BusStatus::DataReadAcked,
            ) => Self::Acked,
            Some(
                BusStatus::BusError
                | BusStatus::AddressWriteNacked
                | BusStatus::DataWriteNacked
                | BusStatus::AddressReadNacked
                | BusStatus::DataReadNacked
                | BusStatus::ArbitrationLost,
            ) => Self::Nacked,
            _ => Self::Unexpected,
        }
    }
}

/// Bounded retry counter for the start/addressing handshake.
///
/// A single budget is shared by start contention and address rejection within
/// one transaction. The counter saturates at zero; it can never wrap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u8,
}

impl RetryBudget {
    /// Default number of handshake attempts before a transaction aborts.
    pub const DEFAULT_LIMIT: u8 = 20;

    #[must_use]
    pub fn new(limit: u8) -> Self {
        Self { remaining: limit }
    }

    /// Consume one failed attempt. Returns `true` while retries remain,
    /// `false` once the budget has reached zero.
    pub fn consume(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining > 0
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Failure of a register read or write transaction.
///
/// Each variant carries a stable numeric code (see [`TransferError::code`])
/// so callers ported from status-code APIs can still branch on raw values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferError {
    /// The retry budget ran out before a start condition was accepted.
    StartExhausted,
    /// The retry budget ran out before the slave acknowledged its address.
    AddressExhausted,
    /// The slave rejected the intra-device register offset.
    OffsetRejected,
    /// The repeated start switching to read direction was not accepted.
    RepeatedStartRejected,
    /// The slave rejected its address with the read direction bit set.
    ReadAddressRejected,
    /// The slave rejected a data byte during the write phase.
    DataRejected,
}

impl TransferError {
    /// Stable numeric code for this failure.
    ///
    /// Read transactions produce codes 1 through 5; write transactions
    /// produce 1 through 4, where 4 is [`TransferError::DataRejected`]. The
    /// two code-4 variants cannot occur on the same path.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::StartExhausted => 1,
            Self::AddressExhausted => 2,
            Self::OffsetRejected => 3,
            Self::RepeatedStartRejected | Self::DataRejected => 4,
            Self::ReadAddressRejected => 5,
        }
    }

    /// Short human-readable description, suitable for logging.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::StartExhausted => "twi: start condition never accepted",
            Self::AddressExhausted => "twi: slave address never acknowledged",
            Self::OffsetRejected => "twi: register offset rejected",
            Self::RepeatedStartRejected => "twi: repeated start rejected",
            Self::ReadAddressRejected => "twi: read address rejected",
            Self::DataRejected => "twi: data byte rejected",
        }
    }
}

impl core::fmt::Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.description())
    }
}

impl embedded_hal::i2c::Error for TransferError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::StartExhausted => ErrorKind::ArbitrationLoss,
            Self::AddressExhausted | Self::ReadAddressRejected => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            Self::OffsetRejected | Self::DataRejected => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
            }
            Self::RepeatedStartRejected => ErrorKind::Bus,
        }
    }
}

/// Compute the TWI bit-rate divider for the given clocks.
///
/// The bus clock comes out as `cpu / (16 + 2 * divider)` with the prescaler
/// cleared. CPU clocks too slow for the formula produce a divider of zero,
/// matching what the hardware is programmed with below 1.6 MHz.
#[must_use]
pub fn bit_rate_divider(cpu_clock: HertzU32, bus_clock: HertzU32) -> u8 {
    let bus = bus_clock.to_Hz().max(1);
    let divider = (cpu_clock.to_Hz() / bus).saturating_sub(16) / 2;
    divider.min(u32::from(u8::MAX)) as u8
}

/// Static configuration for one TWI peripheral.
pub struct TwiConfig {
    /// CPU core clock feeding the TWI clock generator.
    pub cpu_clock: HertzU32,
    /// Target bus clock. The programmed divider approximates it from below.
    pub bus_clock: HertzU32,
    /// Handshake attempts before a transaction aborts.
    pub retry_limit: u8,
}

impl TwiConfig {
    /// The bit-rate divider this configuration programs.
    #[must_use]
    pub fn bit_rate_divider(&self) -> u8 {
        bit_rate_divider(self.cpu_clock, self.bus_clock)
    }
}

pub struct TwiConfigBuilder {
    cpu_clock: HertzU32,
    bus_clock: HertzU32,
    retry_limit: u8,
}

impl Default for TwiConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TwiConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cpu_clock: HertzU32::MHz(4),
            bus_clock: HertzU32::kHz(200),
            retry_limit: RetryBudget::DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn cpu_clock(mut self, clock: HertzU32) -> Self {
        self.cpu_clock = clock;
        self
    }

    #[must_use]
    pub fn bus_clock(mut self, clock: HertzU32) -> Self {
        self.bus_clock = clock;
        self
    }

    #[must_use]
    pub fn retry_limit(mut self, limit: u8) -> Self {
        self.retry_limit = limit;
        self
    }

    #[must_use]
    pub fn build(self) -> TwiConfig {
        TwiConfig {
            cpu_clock: self.cpu_clock,
            bus_clock: self.bus_clock,
            retry_limit: self.retry_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_byte_composition() {
        assert_eq!(Direction::Write.address_byte(0x50), 0xA0);
        assert_eq!(Direction::Read.address_byte(0x50), 0xA1);
        assert_eq!(Direction::Read.address_byte(0x00), 0x01);
        assert_eq!(Direction::Write.address_byte(0x7F), 0xFE);
    }

    #[test]
    fn test_status_from_raw() {
        assert_eq!(BusStatus::from_raw(0x08), Some(BusStatus::StartTransmitted));
        assert_eq!(
            BusStatus::from_raw(0x10),
            Some(BusStatus::RepeatedStartTransmitted)
        );
        assert_eq!(BusStatus::from_raw(0x18), Some(BusStatus::AddressWriteAcked));
        assert_eq!(BusStatus::from_raw(0x58), Some(BusStatus::DataReadNacked));
        assert_eq!(BusStatus::from_raw(0x00), Some(BusStatus::BusError));

        // Prescaler bits must not affect classification
        assert_eq!(BusStatus::from_raw(0x0B), Some(BusStatus::StartTransmitted));

        assert_eq!(BusStatus::from_raw(0x60), None);
        assert_eq!(BusStatus::from_raw(0xE8), None);
    }

    #[test]
    fn test_start_classification() {
        assert_eq!(
            StartOutcome::classify(Some(BusStatus::StartTransmitted)),
            StartOutcome::Accepted
        );
        assert_eq!(
            StartOutcome::classify(Some(BusStatus::RepeatedStartTransmitted)),
            StartOutcome::Accepted
        );
        assert_eq!(
            StartOutcome::classify(Some(BusStatus::ArbitrationLost)),
            StartOutcome::Collision
        );
        assert_eq!(StartOutcome::classify(None), StartOutcome::Collision);
    }

    #[test]
    fn test_write_classification() {
        assert_eq!(
            WriteOutcome::classify(Some(BusStatus::AddressWriteAcked)),
            WriteOutcome::Acked
        );
        assert_eq!(
            WriteOutcome::classify(Some(BusStatus::DataReadAcked)),
            WriteOutcome::Acked
        );
        assert_eq!(
            WriteOutcome::classify(Some(BusStatus::AddressWriteNacked)),
            WriteOutcome::Nacked
        );
        assert_eq!(
            WriteOutcome::classify(Some(BusStatus::BusError)),
            WriteOutcome::Nacked
        );
        assert_eq!(
            WriteOutcome::classify(Some(BusStatus::ArbitrationLost)),
            WriteOutcome::Nacked
        );
        assert_eq!(
            WriteOutcome::classify(Some(BusStatus::StartTransmitted)),
            WriteOutcome::Unexpected
        );
        assert_eq!(WriteOutcome::classify(None), WriteOutcome::Unexpected);
    }

    #[test]
    fn test_retry_budget_counts_down() {
        let mut budget = RetryBudget::new(3);
        assert!(budget.consume());
        assert!(budget.consume());
        assert!(!budget.consume());
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_retry_budget_saturates() {
        let mut budget = RetryBudget::new(1);
        assert!(!budget.consume());
        // Further consumption must not wrap past zero
        assert!(!budget.consume());
        assert!(!budget.consume());
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(TransferError::StartExhausted.code(), 1);
        assert_eq!(TransferError::AddressExhausted.code(), 2);
        assert_eq!(TransferError::OffsetRejected.code(), 3);
        assert_eq!(TransferError::RepeatedStartRejected.code(), 4);
        assert_eq!(TransferError::ReadAddressRejected.code(), 5);
        assert_eq!(TransferError::DataRejected.code(), 4);
    }

    #[test]
    fn test_divider_values() {
        // 4 MHz CPU, 200 kHz bus: (20 - 16) / 2
        assert_eq!(
            bit_rate_divider(HertzU32::MHz(4), HertzU32::kHz(200)),
            2
        );
        // 16 MHz CPU, 200 kHz bus: (80 - 16) / 2
        assert_eq!(
            bit_rate_divider(HertzU32::MHz(16), HertzU32::kHz(200)),
            32
        );
        // 16 MHz CPU, 100 kHz bus
        assert_eq!(
            bit_rate_divider(HertzU32::MHz(16), HertzU32::kHz(100)),
            72
        );
        // Below 1.6 MHz the formula underflows; the divider clamps to zero
        assert_eq!(
            bit_rate_divider(HertzU32::MHz(1), HertzU32::kHz(200)),
            0
        );
    }

    #[test]
    fn test_divider_is_idempotent() {
        let first = bit_rate_divider(HertzU32::MHz(4), HertzU32::kHz(200));
        for _ in 0..10 {
            assert_eq!(bit_rate_divider(HertzU32::MHz(4), HertzU32::kHz(200)), first);
        }
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = TwiConfigBuilder::new().build();
        assert_eq!(config.cpu_clock, HertzU32::MHz(4));
        assert_eq!(config.bus_clock, HertzU32::kHz(200));
        assert_eq!(config.retry_limit, 20);
        assert_eq!(config.bit_rate_divider(), 2);
    }

    #[test]
    fn test_config_builder_overrides() {
        let config = TwiConfigBuilder::new()
            .cpu_clock(HertzU32::MHz(16))
            .bus_clock(HertzU32::kHz(100))
            .retry_limit(5)
            .build();
        assert_eq!(config.retry_limit, 5);
        assert_eq!(config.bit_rate_divider(), 72);
    }
}
