use std::fmt::Display;
use std::time::Duration;

use lens_traits::Delay;

/// Retry budget of the camera sensor bus helper.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Run `op` until it succeeds or `max_attempts` attempts have failed.
///
/// Waits `pause` on `delay` between attempts and returns the last error
/// when the budget is exhausted. `max_attempts` of 0 is treated as 1.
pub fn with_retries<T, E: Display>(
    max_attempts: u32,
    pause: Duration,
    delay: &dyn Delay,
    mut op: impl FnMut() -> Result<T, E>,
) -> Result<T, E> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_attempts => {
                tracing::warn!(attempt, max_attempts, error = %e, "bus transfer failed, retrying");
                attempt += 1;
                delay.delay(pause);
            }
            Err(e) => {
                tracing::error!(attempts = attempt, error = %e, "bus transfer failed");
                return Err(e);
            }
        }
    }
}
