//! Simulated peripherals shared by the unit tests.

use crate::hal::{Acknowledge, BusPeripheral, ReferenceStore, Watchdog};
use crate::timer::TickSource;
use core::convert::Infallible;

/// Two-wire port with a single scripted slave behind it.
///
/// Start, stop, buffer loads and acknowledges each complete instantly and
/// raise the event flag, until `event_limit` completions have happened;
/// after that the flag never rises again.
#[derive(Debug, Clone, Default)]
pub(crate) struct SimPort {
    pub(crate) write_collision: bool,
    pub(crate) bus_collision: bool,
    pub(crate) acks: bool,
    pub(crate) event_limit: Option<usize>,
    pub(crate) rx_data: Vec<u8>,

    pub(crate) event: bool,
    pub(crate) events_fired: usize,
    pub(crate) event_polls: usize,
    pub(crate) loaded: Vec<u8>,
    pub(crate) rx_index: usize,
    pub(crate) receive_enabled: bool,
    pub(crate) acknowledges: Vec<Acknowledge>,
    pub(crate) starts: usize,
    pub(crate) stops: usize,
}

impl SimPort {
    pub(crate) fn acking() -> Self {
        Self {
            acks: true,
            ..Self::default()
        }
    }

    fn complete(&mut self) {
        if self.event_limit.is_none_or(|limit| self.events_fired < limit) {
            self.events_fired += 1;
            self.event = true;
        }
    }
}

impl BusPeripheral for SimPort {
    fn write_collision(&mut self) -> bool {
        self.write_collision
    }

    fn clear_write_collision(&mut self) {
        self.write_collision = false;
    }

    fn bus_collision(&mut self) -> bool {
        self.bus_collision
    }

    fn clear_bus_collision(&mut self) {
        self.bus_collision = false;
    }

    fn event(&mut self) -> bool {
        self.event_polls += 1;
        self.event
    }

    fn clear_event(&mut self) {
        self.event = false;
    }

    fn request_start(&mut self) {
        self.starts += 1;
        self.complete();
    }

    fn request_stop(&mut self) {
        self.stops += 1;
        self.complete();
    }

    fn ack_received(&mut self) -> bool {
        self.acks
    }

    fn buffer_full(&mut self) -> bool {
        self.receive_enabled && self.rx_index < self.rx_data.len()
    }

    fn load_buffer(&mut self, byte: u8) {
        self.loaded.push(byte);
        self.complete();
    }

    fn take_buffer(&mut self) -> u8 {
        let byte = self.rx_data[self.rx_index];
        self.rx_index += 1;
        self.receive_enabled = false;
        byte
    }

    fn enable_receive(&mut self, enabled: bool) {
        self.receive_enabled = enabled;
    }

    fn send_acknowledge(&mut self, ack: Acknowledge) {
        self.acknowledges.push(ack);
        self.complete();
    }
}

/// Tick source whose flag the test raises by hand.
///
/// Every poll that finds the flag down counts as one spin of the wait loop.
#[derive(Debug, Default)]
pub(crate) struct SimTick {
    pub(crate) pending: usize,
    pub(crate) spins_before_tick: usize,
    pub(crate) spins: usize,
    pub(crate) taken: usize,
}

impl SimTick {
    pub(crate) fn raised(pending: usize) -> Self {
        Self {
            pending,
            ..Self::default()
        }
    }
}

impl TickSource for SimTick {
    fn poll_tick(&mut self) -> nb::Result<(), Infallible> {
        if self.pending > 0 && self.spins >= self.spins_before_tick {
            self.pending -= 1;
            self.taken += 1;
            self.spins = 0;
            Ok(())
        } else {
            self.spins += 1;
            Err(nb::Error::WouldBlock)
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct SimWatchdog {
    pub(crate) feeds: usize,
}

impl Watchdog for SimWatchdog {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

/// Reference storage backed by four bytes of RAM.
#[derive(Debug, Clone)]
pub(crate) struct MemStore {
    pub(crate) bytes: [u8; 4],
    pub(crate) fail: bool,
    pub(crate) writes: usize,
}

impl MemStore {
    /// Storage that was never written.
    pub(crate) fn erased() -> Self {
        Self {
            bytes: [0xff; 4],
            fail: false,
            writes: 0,
        }
    }
}

impl ReferenceStore for MemStore {
    type Error = ();

    fn load(&mut self) -> Result<[u8; 4], Self::Error> {
        if self.fail { Err(()) } else { Ok(self.bytes) }
    }

    fn store(&mut self, bytes: &[u8; 4]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(());
        }
        self.bytes = *bytes;
        self.writes += 1;
        Ok(())
    }
}
