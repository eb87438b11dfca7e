use super::TickSource;
use core::cell::Cell;
use core::convert::Infallible;
use core::fmt;
use critical_section::Mutex;

/// Tick flag raised from the counter's interrupt handler.
///
/// Meant to live in a `static`, shared between the interrupt and the tick
/// loop. [`raise()`](TickFlag::raise) sets the flag and counts the period;
/// polling through [`TickSource`] reads and clears the flag inside a critical
/// section.
///
/// # Example
/// ```rust,ignore
/// static TICK: TickFlag = TickFlag::new();
///
/// #[interrupt]
/// fn TMR2() {
///     TICK.raise();
/// }
///
/// // main
/// let mut tick = &TICK;
/// wait_tick(&mut tick, &mut watchdog);
/// ```
///
/// # Notes
/// A period that ends while the flag is still raised is counted but not
/// queued: an overrunning tick loop skips ticks, it does not catch up.
pub struct TickFlag {
    raised: Mutex<Cell<bool>>,
    periods: Mutex<Cell<u32>>,
}

impl TickFlag {
    /// Creates a lowered flag.
    pub const fn new() -> Self {
        Self {
            raised: Mutex::new(Cell::new(false)),
            periods: Mutex::new(Cell::new(0)),
        }
    }

    /// Raises the flag. Call from the counter interrupt.
    pub fn raise(&self) {
        critical_section::with(|cs| {
            self.raised.borrow(cs).set(true);
            let periods = self.periods.borrow(cs);
            periods.set(periods.get().wrapping_add(1));
        });
    }

    /// Number of periods elapsed since creation (wrapping).
    pub fn periods(&self) -> u32 {
        critical_section::with(|cs| self.periods.borrow(cs).get())
    }

    /// Whether the flag is raised, without clearing it.
    pub fn is_raised(&self) -> bool {
        critical_section::with(|cs| self.raised.borrow(cs).get())
    }
}

impl Default for TickFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TickFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickFlag")
            .field("raised", &self.is_raised())
            .field("periods", &self.periods())
            .finish()
    }
}

impl TickSource for &TickFlag {
    fn poll_tick(&mut self) -> nb::Result<(), Infallible> {
        if critical_section::with(|cs| self.raised.borrow(cs).replace(false)) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}
