use super::{TickPeriod, TickSource};
use core::convert::Infallible;
use embedded_hal::delay::DelayNs;

/// Tick source built from a blocking delay.
///
/// For boards without a spare hardware counter. Each poll that finds the
/// period unfinished sleeps for `step_us` and counts it, so the watchdog is
/// still fed every `step_us` by [`wait_tick`](super::wait_tick).
///
/// # Notes
/// - Only idle time is counted. The real period is the work done in the
///   tick plus the configured period, so ticks drift with the workload.
///   Prefer an interrupt-raised `TickFlag` when timing matters.
/// - `step_us` is clamped to at least 1 µs.
///
/// # Example
/// ```rust,ignore
/// let mut tick = DelayTick::new(delay, TickPeriod::DEFAULT, 1_000);
/// wait_tick(&mut tick, &mut watchdog);
/// ```
#[derive(Debug)]
pub struct DelayTick<D> {
    delay: D,
    period_us: u32,
    step_us: u32,
    elapsed_us: u32,
}

impl<D: DelayNs> DelayTick<D> {
    /// Creates a delay-driven tick source.
    pub fn new(delay: D, period: TickPeriod, step_us: u32) -> Self {
        Self {
            delay,
            period_us: period.period_us(),
            step_us: step_us.max(1),
            elapsed_us: 0,
        }
    }

    /// Releases the delay.
    pub fn free(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> TickSource for DelayTick<D> {
    fn poll_tick(&mut self) -> nb::Result<(), Infallible> {
        if self.elapsed_us >= self.period_us {
            self.elapsed_us = 0;
            return Ok(());
        }
        self.delay.delay_us(self.step_us);
        self.elapsed_us = self.elapsed_us.saturating_add(self.step_us);
        Err(nb::Error::WouldBlock)
    }
}
