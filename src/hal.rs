//! Interfaces to the hardware collaborators the core drives.
//!
//! The firmware implements these on top of embassy-stm32; the tests use
//! in-memory doubles.

/// Byte-oriented serial link.
pub trait SerialLink {
    type Error;

    /// Next received byte, or `None` if nothing is pending. Never blocks.
    fn read_byte(&mut self) -> Option<u8>;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Motor driver enable line.
pub trait Actuator {
    fn enable(&mut self);
    fn disable(&mut self);
}

/// Countdown timer that must be reset before it expires.
pub trait Countdown {
    fn arm(&mut self, timeout_ms: u32);
    fn reset(&mut self);
}
