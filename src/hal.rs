//! Hardware-abstraction traits for the peripherals the core drives directly.
//!
//! Plain signal lines (encoder select/clock/data, indicator LED, switches)
//! use the `embedded-hal` digital traits. The pieces below have no
//! `embedded-hal` counterpart: the status and control bits of a polled
//! two-wire master port, the watchdog, and the small non-volatile area that
//! holds the zero references. Production code implements them over the
//! device registers; tests implement them with simulated peripherals.

use core::fmt::Debug;

/// Level clocked out after a received byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Acknowledge {
    /// Ask the slave for another byte.
    Ack,
    /// Tell the slave the read is over.
    Nack,
}

/// Named status and control bits of a two-wire master port.
///
/// Every method touches exactly one bit (or the data buffer) so that the
/// [`BusMaster`](crate::bus::BusMaster) state machine reads like the bus
/// protocol it implements.
pub trait BusPeripheral {
    /// Write-collision flag left over from a previous buffer write.
    fn write_collision(&mut self) -> bool;
    /// Clears the write-collision flag.
    fn clear_write_collision(&mut self);
    /// Bus-collision (arbitration lost) flag.
    fn bus_collision(&mut self) -> bool;
    /// Clears the bus-collision flag.
    fn clear_bus_collision(&mut self);
    /// Event flag raised when a start, stop, byte or acknowledge completes.
    fn event(&mut self) -> bool;
    /// Clears the event flag.
    fn clear_event(&mut self);
    /// Begins a start condition.
    fn request_start(&mut self);
    /// Begins a stop condition.
    fn request_stop(&mut self);
    /// `true` when the slave acknowledged the last byte sent.
    fn ack_received(&mut self) -> bool;
    /// Buffer-full status: a byte is waiting to be shifted out or to be taken.
    fn buffer_full(&mut self) -> bool;
    /// Loads the transmit buffer, which starts shifting the byte out.
    fn load_buffer(&mut self, byte: u8);
    /// Takes the received byte, clearing the buffer-full status.
    fn take_buffer(&mut self) -> u8;
    /// Enables or disables the receiver.
    fn enable_receive(&mut self, enabled: bool);
    /// Starts clocking out an acknowledge bit of the given level.
    fn send_acknowledge(&mut self, ack: Acknowledge);
}

/// Independent reset timer that must be fed from every blocking wait.
pub trait Watchdog {
    /// Restarts the watchdog window.
    fn feed(&mut self);
}

/// Non-volatile storage of the two zero references.
///
/// Layout: channel A low/high byte at offsets 0/1, channel B at 2/3.
pub trait ReferenceStore {
    /// Storage error type.
    type Error: Debug;

    /// Reads the four reference bytes.
    fn load(&mut self) -> Result<[u8; 4], Self::Error>;

    /// Writes the four reference bytes.
    fn store(&mut self, bytes: &[u8; 4]) -> Result<(), Self::Error>;
}
