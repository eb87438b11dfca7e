//! Polled two-wire bus master.
//!
//! This module provides [`BusMaster`], a software state machine that drives a
//! two-wire master port one status bit at a time: start, 7-bit address with
//! direction, acknowledge, data bytes each with their own acknowledge, stop.
//!
//! ## Timeouts
//!
//! Every phase that waits on the hardware uses [`poll_until`] with a retry
//! budget of [`BUS_RETRY_BUDGET`] checks. Running out of retries aborts the
//! transaction on the spot: the remaining phases, including the stop
//! condition, are skipped.
//!
//! ## Errors
//!
//! A transaction returns a [`Transfer`] holding both the number of bytes that
//! made it across and the error, if any, so a caller can see how far a failed
//! transaction got. The error is also kept by the driver and can be read back
//! with [`last_error()`](BusMaster::last_error) until the next transaction
//! starts. Clock stretching and multi-master arbitration are not handled;
//! a lost arbitration is only reported.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut bus = BusMaster::new(port, delay);
//! let transfer = bus.write(0x51, &[0xfe, 0x51]);
//! if let Some(err) = transfer.error {
//!     // transfer.count bytes were acknowledged before `err`
//! }
//! ```

use crate::consts::{BUS_POLL_INTERVAL_US, BUS_READ_POLL_INTERVAL_US, BUS_RETRY_BUDGET};
use crate::error::{BusError, error_code};
use crate::hal::{Acknowledge, BusPeripheral};
use crate::poll::poll_until;
use embedded_hal::delay::DelayNs;

/// Transfer direction, carried in the low bit of the address byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Direction {
    /// Master to slave.
    Write = 0,
    /// Slave to master.
    Read = 1,
}

/// Phase of the transaction state machine.
///
/// `Idle → Start → Address → AckWait → {Write | Read → Acknowledge}* → Stop → Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum BusPhase {
    /// No transaction in progress.
    #[default]
    Idle,
    /// Waiting for the start condition to complete.
    Start,
    /// Shifting out the address byte.
    Address,
    /// Waiting for the slave to acknowledge.
    AckWait,
    /// Shifting out a data byte.
    Write,
    /// Waiting for a data byte from the slave.
    Read,
    /// Clocking out the master's ACK/NACK after a received byte.
    Acknowledge,
    /// Waiting for the stop condition to complete.
    Stop,
}

/// Outcome of one bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Transfer {
    /// Data bytes sent or received before the transaction ended.
    pub count: usize,
    /// Why the transaction ended early, if it did.
    pub error: Option<BusError>,
}

impl Transfer {
    /// `true` when the transaction ran through to its stop condition.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Numeric error code, `0` for success.
    pub fn code(&self) -> u8 {
        error_code(self.error)
    }

    /// Converts into a `Result`, dropping the count on failure.
    pub fn result(self) -> Result<usize, BusError> {
        match self.error {
            None => Ok(self.count),
            Some(err) => Err(err),
        }
    }
}

/// Byte-level access to the two-wire bus.
///
/// Implemented by [`BusMaster`]; collaborators such as
/// [`As5600`](crate::as5600::As5600) and the character display sink only
/// depend on this trait.
pub trait Bus {
    /// Sends `bytes` to the slave at the 7-bit `address`.
    fn write(&mut self, address: u8, bytes: &[u8]) -> Transfer;
    /// Fills `buffer` from the slave at the 7-bit `address`.
    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Transfer;
    /// Error of the most recent transaction, kept until the next one starts.
    fn last_error(&self) -> Option<BusError>;
}

/// Software two-wire master over a [`BusPeripheral`].
///
/// ## Type Parameters
///
/// - `P`: the port's status/control bits
/// - `D`: delay used between status checks
///
/// ## Notes
///
/// The driver assumes a single caller. Its error state belongs to this
/// instance only, but interleaving transactions from two call sites on the
/// same port is not supported.
#[derive(Debug)]
pub struct BusMaster<P, D> {
    peripheral: P,
    delay: D,
    phase: BusPhase,
    last_error: Option<BusError>,
}

impl<P, D> BusMaster<P, D>
where
    P: BusPeripheral,
    D: DelayNs,
{
    /// Creates the driver and clears the event and bus-collision flags.
    pub fn new(peripheral: P, delay: D) -> Self {
        let mut bus = Self {
            peripheral,
            delay,
            phase: BusPhase::Idle,
            last_error: None,
        };
        bus.peripheral.clear_event();
        bus.peripheral.clear_bus_collision();
        bus
    }

    /// Current phase; [`BusPhase::Idle`] between transactions.
    pub fn phase(&self) -> BusPhase {
        self.phase
    }

    /// Error of the most recent transaction. Reading it does not clear it.
    pub fn last_error(&self) -> Option<BusError> {
        self.last_error
    }

    /// Releases the port and the delay.
    pub fn free(self) -> (P, D) {
        (self.peripheral, self.delay)
    }

    /// Writes `bytes` to the slave at the 7-bit `address`.
    ///
    /// # Returns
    /// A [`Transfer`] whose `count` is the number of data bytes the slave
    /// acknowledged, even when the transaction failed part way.
    pub fn write(&mut self, address: u8, bytes: &[u8]) -> Transfer {
        self.last_error = None;
        let mut sent = 0;
        let result = self.write_phases(address, bytes, &mut sent);
        self.finish(address, result, sent)
    }

    /// Reads `buffer.len()` bytes from the slave at the 7-bit `address`.
    ///
    /// Every byte but the last is acknowledged; the last one is NACKed to end
    /// the slave's transmission.
    ///
    /// # Returns
    /// A [`Transfer`] whose `count` is the number of bytes stored in
    /// `buffer`, even when the transaction failed part way.
    pub fn read(&mut self, address: u8, buffer: &mut [u8]) -> Transfer {
        self.last_error = None;
        let mut received = 0;
        let result = self.read_phases(address, buffer, &mut received);
        self.peripheral.enable_receive(false);
        self.finish(address, result, received)
    }

    fn write_phases(
        &mut self,
        address: u8,
        bytes: &[u8],
        sent: &mut usize,
    ) -> Result<(), BusError> {
        self.check_stale_flags()?;
        self.start()?;
        self.address(address, Direction::Write)?;
        for &byte in bytes {
            self.enter(BusPhase::Write);
            poll_until(
                &mut self.delay,
                BUS_RETRY_BUDGET,
                BUS_POLL_INTERVAL_US,
                || !self.peripheral.buffer_full(),
            )?;
            self.peripheral.load_buffer(byte);
            self.wait_event()?;
            self.enter(BusPhase::AckWait);
            self.wait_ack()?;
            *sent += 1;
        }
        self.stop()
    }

    fn read_phases(
        &mut self,
        address: u8,
        buffer: &mut [u8],
        received: &mut usize,
    ) -> Result<(), BusError> {
        self.check_stale_flags()?;
        self.start()?;
        self.address(address, Direction::Read)?;
        let last = buffer.len().saturating_sub(1);
        for (i, slot) in buffer.iter_mut().enumerate() {
            self.enter(BusPhase::Read);
            self.peripheral.enable_receive(true);
            poll_until(
                &mut self.delay,
                BUS_RETRY_BUDGET,
                BUS_READ_POLL_INTERVAL_US,
                || self.peripheral.buffer_full(),
            )?;
            self.peripheral.clear_event();
            *slot = self.peripheral.take_buffer();

            self.enter(BusPhase::Acknowledge);
            let ack = if i == last {
                Acknowledge::Nack
            } else {
                Acknowledge::Ack
            };
            self.peripheral.clear_event();
            self.peripheral.send_acknowledge(ack);
            self.wait_event()?;
            *received += 1;
        }
        self.peripheral.enable_receive(false);
        self.stop()
    }

    fn finish(&mut self, address: u8, result: Result<(), BusError>, count: usize) -> Transfer {
        let error = result.err();
        if let Some(err) = error {
            warn!(
                "bus: {} in {:?} phase, address {}, {} bytes done",
                err,
                self.phase,
                address,
                count
            );
        }
        self.phase = BusPhase::Idle;
        self.last_error = error;
        Transfer { count, error }
    }

    fn enter(&mut self, phase: BusPhase) {
        self.phase = phase;
    }

    // Flags left over from an earlier operation mean the port is in an
    // unknown state; report and clear them without touching the bus.
    fn check_stale_flags(&mut self) -> Result<(), BusError> {
        if self.peripheral.write_collision() {
            self.peripheral.clear_write_collision();
            return Err(BusError::WriteCollision);
        }
        if self.peripheral.bus_collision() {
            self.peripheral.clear_bus_collision();
            return Err(BusError::ArbitrationLost);
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), BusError> {
        self.enter(BusPhase::Start);
        self.peripheral.clear_event();
        self.peripheral.request_start();
        self.wait_event()
    }

    // Only the low 7 bits of `address` go on the wire.
    fn address(&mut self, address: u8, direction: Direction) -> Result<(), BusError> {
        self.enter(BusPhase::Address);
        self.peripheral.load_buffer(((address & 0x7f) << 1) | direction as u8);
        self.wait_event()?;
        self.enter(BusPhase::AckWait);
        self.wait_ack()
    }

    fn stop(&mut self) -> Result<(), BusError> {
        self.enter(BusPhase::Stop);
        self.peripheral.clear_event();
        self.peripheral.request_stop();
        self.wait_event()
    }

    fn wait_event(&mut self) -> Result<(), BusError> {
        let result = poll_until(
            &mut self.delay,
            BUS_RETRY_BUDGET,
            BUS_POLL_INTERVAL_US,
            || self.peripheral.event(),
        );
        self.peripheral.clear_event();
        result.map_err(BusError::from)
    }

    fn wait_ack(&mut self) -> Result<(), BusError> {
        let result = poll_until(
            &mut self.delay,
            BUS_RETRY_BUDGET,
            BUS_POLL_INTERVAL_US,
            || self.peripheral.ack_received(),
        );
        self.peripheral.clear_event();
        result.map_err(BusError::from)
    }
}

impl<P, D> Bus for BusMaster<P, D>
where
    P: BusPeripheral,
    D: DelayNs,
{
    fn write(&mut self, address: u8, bytes: &[u8]) -> Transfer {
        BusMaster::write(self, address, bytes)
    }

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Transfer {
        BusMaster::read(self, address, buffer)
    }

    fn last_error(&self) -> Option<BusError> {
        BusMaster::last_error(self)
    }
}
