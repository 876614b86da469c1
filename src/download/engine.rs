//! Body copy loop with per-transfer throughput sampling.
//!
//! The loop reads whatever the connection has (blocking for at least one
//! byte), appends it to the destination, and reports each chunk and each
//! throughput sample to a [`TransferObserver`]. Timing state lives in a
//! [`ThroughputMeter`] created per call, so concurrent transfers never share
//! a sample window.

use std::io::{self, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::trace;

use super::config::TransferConfig;
use super::error::DownloadError;

/// Source of wall-clock time for throughput sampling.
pub(crate) trait Clock {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Receives body progress from [`copy_body`].
pub(crate) trait TransferObserver {
    /// `bytes` more bytes have been written to the destination.
    fn on_chunk(&mut self, bytes: u64);

    /// A sample window closed with the given rate.
    fn on_sample(&mut self, bytes_per_sec: u64);
}

/// Accumulates bytes over a window and emits a rate once the window is long enough.
#[derive(Debug)]
pub(crate) struct ThroughputMeter {
    interval: Duration,
    window_start: Instant,
    window_bytes: u64,
}

impl ThroughputMeter {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            window_start: now,
            window_bytes: 0,
        }
    }

    /// Adds `bytes` to the current window.
    ///
    /// Returns bytes/sec and starts a new window when at least `interval` has
    /// elapsed since the window opened.
    pub(crate) fn record(&mut self, bytes: u64, now: Instant) -> Option<u64> {
        self.window_bytes = self.window_bytes.saturating_add(bytes);

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_ms = elapsed.as_millis().max(1);
        let rate = u128::from(self.window_bytes) * 1000 / elapsed_ms;

        self.window_start = now;
        self.window_bytes = 0;
        Some(u64::try_from(rate).unwrap_or(u64::MAX))
    }
}

/// Streams `reader` into `writer` until a clean end of stream.
///
/// Returns the number of body bytes written. Reads interrupted by a signal
/// are retried; any other read error ends the copy as a transport failure,
/// leaving what was already written in place.
///
/// # Errors
///
/// [`DownloadError::Transport`] for read errors, [`DownloadError::Io`] for
/// write errors on the destination.
pub(crate) fn copy_body<R, W, C, O>(
    reader: &mut R,
    writer: &mut W,
    clock: &C,
    observer: &mut O,
    config: &TransferConfig,
    url: &str,
    path: &Path,
) -> Result<u64, DownloadError>
where
    R: Read,
    W: Write,
    C: Clock,
    O: TransferObserver,
{
    let mut buf = vec![0u8; config.buffer_size.max(1)];
    let mut meter = ThroughputMeter::new(config.sample_interval, clock.now());
    let mut written: u64 = 0;

    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DownloadError::transport(url, e)),
        };

        writer
            .write_all(&buf[..read])
            .map_err(|e| DownloadError::io(path, e))?;

        let bytes = read as u64;
        written += bytes;
        observer.on_chunk(bytes);

        if let Some(rate) = meter.record(bytes, clock.now()) {
            trace!(bytes_per_sec = rate, written, "throughput sample");
            observer.on_sample(rate);
        }
    }

    writer.flush().map_err(|e| DownloadError::io(path, e))?;
    Ok(written)
}
