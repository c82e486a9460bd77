// Licensed under the Apache-2.0 license

//! Shared capabilities used across driver modules.

/// Sink for driver diagnostics.
///
/// Controllers carry a logger instead of writing to a global facility, which
/// keeps `no_std` builds free of any I/O coupling. Production builds use
/// [`NoOpLogger`]; tests can substitute a capturing implementation.
pub trait Logger {
    /// Record one diagnostic message.
    fn log(&mut self, msg: &str);
}

/// Logger that discards everything. Compiles to nothing.
pub struct NoOpLogger {}

impl Logger for NoOpLogger {
    fn log(&mut self, _msg: &str) {}
}
