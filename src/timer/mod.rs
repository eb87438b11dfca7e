//! Tick source and watchdog-safe waiting.
//!
//! The tick loop is gated by a free-running hardware counter that raises a
//! flag once per period. The flag is the only thing the loop ever blocks on.
//! Two sources are provided: an interrupt-raised flag (`timer-isr` feature)
//! and a blocking delay loop (`delay-loop` feature).
//!
//! Contains:
//! - [`TickSource`]: read-and-clear access to the tick flag
//! - [`wait_tick`]: blocks until the next tick, feeding the watchdog while it spins
//! - [`TickPeriod`]: counter reload and postscale arithmetic
//! - `TickFlag`: interrupt-raised flag (feature `timer-isr`)
//! - `DelayTick`: delay-driven flag (feature `delay-loop`)
//!
//! The counter is clocked from the 31 kHz low-power oscillator through a
//! 1:64 prescaler, so one count is ~2.064 ms:
//!
//! | COUNT | POSTSCALE | Period    |
//! |-------|-----------|-----------|
//! |     5 |         1 |  10.32 ms |
//! |    15 |         4 | 123.84 ms |
//! |    15 |         8 | 247.68 ms |
//! |   242 |         2 |  998.98 ms|
//! |   255 |        16 |   8.42 s  |

use crate::hal::Watchdog;
use core::convert::Infallible;
use libm::round;

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use isr::*;

/// Duration of one counter increment after prescaling (µs).
pub const COUNTER_TICK_US: u32 = 2_064;

/// Largest usable postscaler value.
pub const MAX_POSTSCALE: u8 = 16;

/// Source of the periodic tick flag.
pub trait TickSource {
    /// Checks the tick flag.
    ///
    /// # Returns
    /// - `Ok(())` if the flag was raised; it is cleared by this call
    /// - `Err(nb::Error::WouldBlock)` if the period has not elapsed yet
    fn poll_tick(&mut self) -> nb::Result<(), Infallible>;
}

impl<T: TickSource + ?Sized> TickSource for &mut T {
    fn poll_tick(&mut self) -> nb::Result<(), Infallible> {
        (**self).poll_tick()
    }
}

/// Blocks until the tick flag is raised, then clears it.
///
/// The watchdog is fed on every spin, so a wait of a full period never trips
/// it. The counter keeps running, so periods stay exact even when the work
/// before the wait varies.
pub fn wait_tick<T, W>(tick: &mut T, watchdog: &mut W)
where
    T: TickSource + ?Sized,
    W: Watchdog + ?Sized,
{
    loop {
        match tick.poll_tick() {
            Ok(()) => return,
            Err(nb::Error::WouldBlock) => watchdog.feed(),
            Err(nb::Error::Other(never)) => match never {},
        }
    }
}

/// Reload count and postscale of the free-running counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TickPeriod {
    count: u8,
    postscale: u8,
}

impl TickPeriod {
    /// 15 counts x 8 postscale = 247.68 ms, about four ticks per second.
    pub const DEFAULT: TickPeriod = TickPeriod {
        count: 15,
        postscale: 8,
    };

    /// Builds a period, clamping `count` to at least 1 and `postscale` to
    /// `1..=16`.
    pub const fn new(count: u8, postscale: u8) -> Self {
        let count = if count == 0 { 1 } else { count };
        let postscale = if postscale == 0 {
            1
        } else if postscale > MAX_POSTSCALE {
            MAX_POSTSCALE
        } else {
            postscale
        };
        Self { count, postscale }
    }

    /// Picks the smallest postscale that can express `period_ms`, rounding
    /// the count to the nearest integer.
    ///
    /// Periods beyond the counter's range saturate at 255 x 16.
    pub fn from_millis(period_ms: f32) -> Self {
        let period_us = f64::from(period_ms) * 1_000.0;
        for postscale in 1..=MAX_POSTSCALE {
            let count = round(period_us / f64::from(COUNTER_TICK_US * u32::from(postscale)));
            if count <= f64::from(u8::MAX) {
                return Self::new(count as u8, postscale);
            }
        }
        Self::new(u8::MAX, MAX_POSTSCALE)
    }

    /// Counts per postscaler output.
    pub const fn count(self) -> u8 {
        self.count
    }

    /// Postscaler ratio.
    pub const fn postscale(self) -> u8 {
        self.postscale
    }

    /// Value for the period register (count - 1).
    pub const fn period_register(self) -> u8 {
        self.count - 1
    }

    /// Value for the postscaler field (postscale - 1).
    pub const fn postscale_register(self) -> u8 {
        self.postscale - 1
    }

    /// Length of one period (µs).
    pub const fn period_us(self) -> u32 {
        self.count as u32 * self.postscale as u32 * COUNTER_TICK_US
    }
}

impl Default for TickPeriod {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimTick, SimWatchdog};

    #[test]
    fn test_default_period() {
        assert_eq!(TickPeriod::DEFAULT.period_us(), 247_680);
        assert_eq!(TickPeriod::DEFAULT.period_register(), 14);
        assert_eq!(TickPeriod::DEFAULT.postscale_register(), 7);
    }

    #[test]
    fn test_postscale_clamped() {
        let period = TickPeriod::new(0, 40);
        assert_eq!(period.count(), 1);
        assert_eq!(period.postscale(), 16);
        assert_eq!(TickPeriod::new(3, 0).postscale(), 1);
    }

    #[test]
    fn test_from_millis() {
        assert_eq!(TickPeriod::from_millis(10.32), TickPeriod::new(5, 1));
        assert_eq!(TickPeriod::from_millis(1_000.0), TickPeriod::new(242, 2));
        assert_eq!(TickPeriod::from_millis(60_000.0), TickPeriod::new(255, 16));
    }

    #[test]
    fn test_wait_feeds_watchdog_while_spinning() {
        let mut tick = SimTick::raised(1);
        tick.spins_before_tick = 5;
        let mut watchdog = SimWatchdog::default();

        wait_tick(&mut tick, &mut watchdog);
        assert_eq!(tick.taken, 1);
        assert_eq!(watchdog.feeds, 5);
        assert_eq!(tick.poll_tick(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_wait_returns_at_once_when_raised() {
        let mut tick = SimTick::raised(2);
        let mut watchdog = SimWatchdog::default();
        wait_tick(&mut tick, &mut watchdog);
        wait_tick(&mut tick, &mut watchdog);
        assert_eq!(tick.taken, 2);
        assert_eq!(watchdog.feeds, 0);
    }
}
