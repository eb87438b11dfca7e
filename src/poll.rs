//! Bounded polling.
//!
//! Hardware waits in this crate never use a clock. They check a condition a
//! fixed number of times with a fixed pause between checks, so the worst case
//! is known up front (`budget * interval_us`) and a dead peripheral can never
//! hang the caller.

use crate::error::BusError;
use embedded_hal::delay::DelayNs;

/// Returned by [`poll_until`] when the condition never became true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Exhausted;

impl From<Exhausted> for BusError {
    fn from(_: Exhausted) -> Self {
        BusError::Timeout
    }
}

/// Checks `ready` up to `budget` times, pausing `interval_us` after each
/// failed check.
///
/// # Returns
/// - `Ok(())` as soon as `ready` returns `true`
/// - `Err(Exhausted)` after `budget` failed checks
///
/// A `budget` of zero never checks and always fails.
pub fn poll_until<D, F>(
    delay: &mut D,
    budget: u8,
    interval_us: u32,
    mut ready: F,
) -> Result<(), Exhausted>
where
    D: DelayNs,
    F: FnMut() -> bool,
{
    let mut retries = budget;
    while retries > 0 {
        if ready() {
            return Ok(());
        }
        delay.delay_us(interval_us);
        retries -= 1;
    }
    Err(Exhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn test_ready_on_first_check() {
        let mut delay = NoopDelay::new();
        let mut checks = 0;
        let result = poll_until(&mut delay, 255, 2, || {
            checks += 1;
            true
        });
        assert_eq!(result, Ok(()));
        assert_eq!(checks, 1);
    }

    #[test]
    fn test_ready_after_some_checks() {
        let mut delay = NoopDelay::new();
        let mut checks = 0;
        let result = poll_until(&mut delay, 255, 2, || {
            checks += 1;
            checks == 40
        });
        assert_eq!(result, Ok(()));
        assert_eq!(checks, 40);
    }

    #[test]
    fn test_exhausts_budget() {
        let mut delay = NoopDelay::new();
        let mut checks = 0u32;
        let result = poll_until(&mut delay, 255, 2, || {
            checks += 1;
            false
        });
        assert_eq!(result, Err(Exhausted));
        assert_eq!(checks, 255);
        assert_eq!(BusError::from(Exhausted), BusError::Timeout);
    }

    #[test]
    fn test_zero_budget_never_checks() {
        let mut delay = NoopDelay::new();
        let mut checked = false;
        assert_eq!(
            poll_until(&mut delay, 0, 2, || {
                checked = true;
                true
            }),
            Err(Exhausted)
        );
        assert!(!checked);
    }
}
