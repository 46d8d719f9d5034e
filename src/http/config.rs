//! Client configuration.

use std::time::Duration;

/// Default number of attempts per request, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Default per-attempt network timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings fixed at construction time.
///
/// ```
/// use std::time::Duration;
/// use mpesakit::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_session(true)
///     .with_timeout(Duration::from_secs(30));
/// assert_eq!(config.max_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Hold one connection pool for the client's lifetime instead of
    /// opening a fresh one per call.
    pub use_session: bool,
    /// Network timeout of a single attempt. Expiry counts as a transient failure.
    pub timeout: Duration,
    /// Total attempts per request. Zero is treated as one.
    pub max_attempts: usize,
    /// Fixed pause between attempts.
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            use_session: false,
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::ZERO,
        }
    }
}

impl ClientConfig {
    /// Sets whether one connection pool is reused across calls.
    pub fn with_session(mut self, use_session: bool) -> Self {
        self.use_session = use_session;
        self
    }

    /// Sets the per-attempt network timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the total number of attempts per request.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the pause between attempts.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Attempt cap actually applied by the retry loop.
    pub(crate) fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }
}
