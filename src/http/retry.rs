//! Bounded retry of transient transport failures.

use log::{debug, warn};
use std::time::Duration;

use super::transport::TransportError;

/// Runs `operation` up to `max_attempts` times.
///
/// Transient failures are retried until the cap is reached, then the last one
/// is returned. Any other failure is returned on first occurrence.
pub fn with_retry<T, F>(
    operation_name: &str,
    max_attempts: usize,
    delay: Duration,
    mut operation: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Result<T, TransportError>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_transient() => {
                debug!("{}: non-retryable error: {}", operation_name, e);
                return Err(e);
            }
            Err(e) if attempt >= max_attempts => {
                warn!(
                    "{}: giving up after {} attempts ({})",
                    operation_name, attempt, e
                );
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "{}: attempt {}/{} failed ({}), retrying...",
                    operation_name, attempt, max_attempts, e
                );
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                attempt += 1;
            }
        }
    }
}
