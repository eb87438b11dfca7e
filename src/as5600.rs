//! Absolute magnetic encoder on the two-wire bus (AS5600 class).
//!
//! The raw angle is a 12-bit value held in two registers starting at
//! [`AS5600_RAW_ANGLE_REGISTER`]: the register pointer is written, then two
//! bytes are read back, high byte first, top nibble unused.

use crate::bus::Bus;
use crate::consts::{AS5600_ADDRESS, AS5600_RAW_ANGLE_REGISTER};
use crate::encoder::Resolution;
use crate::error::BusError;

/// Handle for one absolute encoder at a fixed bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct As5600 {
    address: u8,
}

impl Default for As5600 {
    fn default() -> Self {
        Self::new(AS5600_ADDRESS)
    }
}

impl As5600 {
    /// Resolution of the raw angle.
    pub const RESOLUTION: Resolution = Resolution::Bits12;

    /// Encoder at the 7-bit `address`.
    pub const fn new(address: u8) -> Self {
        Self { address }
    }

    /// Bus address.
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Reads the 12-bit raw angle.
    ///
    /// # Errors
    /// The first failed transaction's error. Nothing is retried.
    pub fn read_raw_angle<B: Bus + ?Sized>(&self, bus: &mut B) -> Result<u16, BusError> {
        let _ = bus
            .write(self.address, &[AS5600_RAW_ANGLE_REGISTER])
            .result()?;
        let mut buf = [0u8; 2];
        let _ = bus.read(self.address, &mut buf).result()?;
        Ok(Self::RESOLUTION.apply(u16::from_be_bytes(buf)))
    }
}
