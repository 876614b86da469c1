//! Per-task transfer configuration.

use std::time::Duration;

use super::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_MAX_HEADER_BYTES, DEFAULT_SAMPLE_INTERVAL};

/// Tunables for a [`DownloadTask`](super::DownloadTask).
///
/// The default performs fully blocking I/O with no timeouts and samples
/// throughput once per second.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use rangeget::download::TransferConfig;
///
/// let config = TransferConfig::default()
///     .with_connect_timeout(Duration::from_secs(10))
///     .with_read_timeout(Duration::from_secs(60));
/// assert_eq!(config.connect_timeout, Some(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Per-endpoint connect timeout. `None` blocks until the OS gives up.
    pub connect_timeout: Option<Duration>,
    /// Socket read timeout. `None` lets a stalled peer block forever.
    pub read_timeout: Option<Duration>,
    /// Minimum wall-clock time between throughput samples.
    pub sample_interval: Duration,
    /// Size of the body read buffer.
    pub buffer_size: usize,
    /// Largest response head accepted before the response is rejected.
    pub max_header_bytes: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            read_timeout: None,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
        }
    }
}

impl TransferConfig {
    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Sets the throughput sample interval.
    #[must_use]
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Sets the body read buffer size (at least one byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Sets the largest response head accepted.
    #[must_use]
    pub fn with_max_header_bytes(mut self, limit: usize) -> Self {
        self.max_header_bytes = limit;
        self
    }
}
