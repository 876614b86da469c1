//! Constants for the download module (wire format, sampling, buffers).

use std::time::Duration;

/// Port for the "http" service, used when the URL authority carries none.
pub const HTTP_PORT: u16 = 80;

/// Scheme prefix stripped by the URL resolver.
pub const HTTP_SCHEME: &str = "http://";

/// Range header name as emitted on the wire. Servers match header names
/// case-insensitively.
pub const RANGE_HEADER: &str = "RANGE";

/// Default interval between throughput samples (and progress events).
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Default body read buffer size (16 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Default upper bound on the size of a response head (64 KiB).
pub const DEFAULT_MAX_HEADER_BYTES: usize = 64 * 1024;
