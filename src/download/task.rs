//! A single resumable download: one URL, one destination file.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::client::{
    check_status, fetch_content_length, open_connection, read_response_head, send_request,
};
use super::config::TransferConfig;
use super::engine::{SystemClock, TransferObserver, copy_body};
use super::error::DownloadError;
use super::http::{Header, build_request, declared_length, find_header};
use super::progress::{DownloadEvent, ProgressCallback};
use super::url::{ResourceLocation, foreign_scheme, parse_url};

/// What a successful [`DownloadTask::try_transfer`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The destination was already at least as large as the remote file; no request was sent.
    AlreadyComplete,
    /// The body was streamed to the destination.
    Completed {
        /// Body bytes written during this call.
        bytes_written: u64,
        /// Offset the body was appended at.
        resumed_from: u64,
        /// The server ignored the range request and the destination was rewritten from zero.
        restarted: bool,
    },
}

/// A resumable single-connection download.
///
/// The task remembers the remote size once known, the number of bytes on disk,
/// the latest throughput sample and the status and headers of the most recent
/// response. It is driven by [`transfer`](Self::transfer), which blocks until
/// the body has been streamed or the attempt failed; calling it again after a
/// failure resumes from the bytes already on disk.
///
/// `U` is opaque user data handed back to the progress callback untouched.
///
/// # Example
///
/// ```no_run
/// use rangeget::download::{DownloadEvent, DownloadTask};
///
/// let mut task = DownloadTask::with_callback(
///     "http://example.com/big.iso",
///     "big.iso",
///     |task, event, label| {
///         if event == DownloadEvent::Progress {
///             println!("{label}: {} bytes, {} B/s", task.downloaded(), task.throughput());
///         }
///     },
///     "big.iso",
/// );
/// if !task.transfer() {
///     eprintln!("failed; run again to resume");
/// }
/// ```
pub struct DownloadTask<U = ()> {
    remote_url: String,
    local_path: PathBuf,
    location: ResourceLocation,
    remote_length: u64,
    downloaded: u64,
    throughput: u64,
    finished: bool,
    status_code: u16,
    headers: Vec<Header>,
    config: TransferConfig,
    callback: Option<ProgressCallback<U>>,
    user_data: U,
}

impl DownloadTask<()> {
    /// Creates a task without a progress callback.
    pub fn new(remote_url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self::from_parts(remote_url, local_path, None, ())
    }
}

impl<U> DownloadTask<U> {
    /// Creates a task that reports progress to `callback`, passing `user_data` along.
    pub fn with_callback<F>(
        remote_url: impl Into<String>,
        local_path: impl Into<PathBuf>,
        callback: F,
        user_data: U,
    ) -> Self
    where
        F: FnMut(&DownloadTask<U>, DownloadEvent, &U) + Send + 'static,
    {
        Self::from_parts(remote_url, local_path, Some(Box::new(callback)), user_data)
    }

    /// Creates a task from an optional boxed callback and user data.
    pub fn from_parts(
        remote_url: impl Into<String>,
        local_path: impl Into<PathBuf>,
        callback: Option<ProgressCallback<U>>,
        user_data: U,
    ) -> Self {
        let remote_url = remote_url.into();
        let location = parse_url(&remote_url);
        Self {
            remote_url,
            local_path: local_path.into(),
            location,
            remote_length: 0,
            downloaded: 0,
            throughput: 0,
            finished: false,
            status_code: 0,
            headers: Vec::new(),
            config: TransferConfig::default(),
            callback,
            user_data,
        }
    }

    /// Replaces the transfer configuration.
    #[must_use]
    pub fn with_config(mut self, config: TransferConfig) -> Self {
        self.config = config;
        self
    }

    /// The URL as given at construction.
    #[must_use]
    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// The destination path.
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Host (authority) derived from the URL.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.location.host
    }

    /// Request path derived from the URL.
    #[must_use]
    pub fn resource_path(&self) -> &str {
        &self.location.path
    }

    /// Cached remote length; 0 until a size query succeeded.
    #[must_use]
    pub fn remote_length(&self) -> u64 {
        self.remote_length
    }

    /// Bytes of the file currently on disk that this task accounts for.
    #[must_use]
    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }

    /// Latest throughput sample in bytes per second.
    #[must_use]
    pub fn throughput(&self) -> u64 {
        self.throughput
    }

    /// Whether a transfer has completed successfully.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Status code of the most recent transfer response (0 before any).
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// `Content-Length` of the most recent transfer response, if it declared one.
    ///
    /// For a `206` this is the length of the remaining range, not of the file.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        declared_length(&self.headers)
    }

    /// Header pairs of the most recent transfer response, in wire order.
    #[must_use]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// First header of the most recent response named `name` (ASCII case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The user data passed at construction.
    pub fn user_data(&self) -> &U {
        &self.user_data
    }

    /// The active transfer configuration.
    #[must_use]
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Returns the remote file size, or 0 when it cannot be determined.
    ///
    /// Failures are logged and reported as 0. See
    /// [`try_remote_size`](Self::try_remote_size) for the error itself.
    pub fn remote_size(&mut self) -> u64 {
        match self.try_remote_size() {
            Ok(length) => length,
            Err(e) => {
                warn!(url = %self.remote_url, error = %e, "remote size query failed");
                0
            }
        }
    }

    /// Returns the remote file size from `Content-Length`.
    ///
    /// A non-zero result is cached; later calls return it without touching the
    /// network. A 2xx response without `Content-Length` yields `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Any connection, protocol or status failure of the round-trip.
    #[instrument(skip(self), fields(url = %self.remote_url))]
    pub fn try_remote_size(&mut self) -> Result<u64, DownloadError> {
        if self.remote_length != 0 {
            return Ok(self.remote_length);
        }
        self.ensure_http_scheme()?;

        let length = fetch_content_length(&self.location, &self.remote_url, &self.config)?;
        if length != 0 {
            debug!(length, "remote length cached");
            self.remote_length = length;
        }
        Ok(length)
    }

    /// Downloads (or resumes) the file, returning whether it succeeded.
    ///
    /// Failures are logged; the partial file is kept so a later call resumes.
    pub fn transfer(&mut self) -> bool {
        match self.try_transfer() {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    url = %self.remote_url,
                    path = %self.local_path.display(),
                    kind = ?e.kind(),
                    error = %e,
                    "download failed"
                );
                false
            }
        }
    }

    /// Downloads (or resumes) the file.
    ///
    /// An existing destination is treated as a partial download: when it is
    /// already as large as the known remote length nothing is sent, otherwise a
    /// `GET` with `RANGE: bytes=<size>-` is issued. A `200` answer to a resumed
    /// request rewrites the destination from zero; any other 2xx is appended.
    /// A `416` whose `Content-Range: bytes */N` equals the local size means the
    /// file was already complete.
    ///
    /// # Errors
    ///
    /// Connection, protocol, transport and local I/O failures, see
    /// [`DownloadError`]. Bytes already appended stay on disk.
    #[instrument(skip(self), fields(url = %self.remote_url, path = %self.local_path.display()))]
    pub fn try_transfer(&mut self) -> Result<TransferOutcome, DownloadError> {
        self.headers.clear();
        self.status_code = 0;
        self.ensure_http_scheme()?;

        let resume_from = match existing_size(&self.local_path)? {
            Some(size) => {
                self.downloaded = size;
                let remote = self.remote_size();
                if remote != 0 && size >= remote {
                    info!(size, remote, "destination already complete");
                    self.finished = true;
                    self.emit(DownloadEvent::Finished);
                    return Ok(TransferOutcome::AlreadyComplete);
                }
                size
            }
            None => {
                self.downloaded = 0;
                0
            }
        };

        let url = self.remote_url.clone();
        let path = self.local_path.clone();
        let config = self.config.clone();

        let mut stream = open_connection(&self.location.host, &url, &config)?;
        let request = build_request(&self.location.host, &self.location.path, Some(resume_from));
        send_request(&mut stream, &request, &url)?;
        debug!(resume_from, "request sent");

        let mut reader = BufReader::with_capacity(config.buffer_size.max(1), stream);
        let head = read_response_head(&mut reader, &url, config.max_header_bytes)?;
        let declared_length = head.content_length();
        let unsatisfied_length = head.unsatisfied_range_length();
        self.status_code = head.status.status;
        self.headers = head.headers;

        if self.status_code == 416 && resume_from > 0 && unsatisfied_length == Some(resume_from) {
            info!(size = resume_from, "server reports range past end of complete file");
            self.remote_length = resume_from;
            self.finished = true;
            self.emit(DownloadEvent::Finished);
            return Ok(TransferOutcome::AlreadyComplete);
        }
        check_status(&head.status, &url)?;

        let restarted = self.status_code == 200 && self.downloaded > 0;
        let mut file = open_destination(&path, restarted)?;
        if restarted {
            info!(
                discarded = self.downloaded,
                "server ignored range request, rewriting from start"
            );
            self.downloaded = 0;
        }
        let body_offset = self.downloaded;

        self.throughput = 0;
        self.emit(DownloadEvent::Started);

        let written = copy_body(
            &mut reader,
            &mut file,
            &SystemClock,
            &mut *self,
            &config,
            &url,
            &path,
        )?;
        drop(file);

        if let Some(expected) = declared_length.filter(|&expected| written < expected) {
            return Err(DownloadError::transport(
                url,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("connection closed after {written} of {expected} body bytes"),
                ),
            ));
        }

        self.finished = true;
        info!(
            status = self.status_code,
            bytes = written,
            total = self.downloaded,
            resumed_from = body_offset,
            "download complete"
        );
        self.emit(DownloadEvent::Finished);

        Ok(TransferOutcome::Completed {
            bytes_written: written,
            resumed_from: body_offset,
            restarted,
        })
    }

    fn ensure_http_scheme(&self) -> Result<(), DownloadError> {
        if let Some(scheme) = foreign_scheme(&self.remote_url) {
            return Err(DownloadError::unsupported_scheme(&self.remote_url, scheme));
        }
        if self.location.host.is_empty() {
            return Err(DownloadError::invalid_url(&self.remote_url));
        }
        Ok(())
    }

    fn emit(&mut self, event: DownloadEvent) {
        if let Some(mut callback) = self.callback.take() {
            callback(&*self, event, &self.user_data);
            self.callback = Some(callback);
        }
    }
}

impl<U> TransferObserver for DownloadTask<U> {
    fn on_chunk(&mut self, bytes: u64) {
        self.downloaded += bytes;
    }

    fn on_sample(&mut self, bytes_per_sec: u64) {
        self.throughput = bytes_per_sec;
        self.emit(DownloadEvent::Progress);
    }
}

impl<U> fmt::Debug for DownloadTask<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadTask")
            .field("remote_url", &self.remote_url)
            .field("local_path", &self.local_path)
            .field("remote_length", &self.remote_length)
            .field("downloaded", &self.downloaded)
            .field("throughput", &self.throughput)
            .field("finished", &self.finished)
            .field("status_code", &self.status_code)
            .field("has_callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

/// Size of the destination, or `None` when it does not exist yet.
fn existing_size(path: &Path) -> Result<Option<u64>, DownloadError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DownloadError::io(path, e)),
    }
}

/// Opens the destination for appending, or truncated when `rewrite` is set.
fn open_destination(path: &Path, rewrite: bool) -> Result<File, DownloadError> {
    let mut options = OpenOptions::new();
    options.create(true);
    if rewrite {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    options.open(path).map_err(|e| DownloadError::io(path, e))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::download::ErrorKind;
    use crate::download::engine::test_support::{ManualClock, ScriptedBody};

    type EventLog = Arc<Mutex<Vec<(DownloadEvent, u64, u64)>>>;

    fn recording_task(url: &str, path: &Path) -> (DownloadTask<&'static str>, EventLog) {
        let log: EventLog = Arc::default();
        let sink = Arc::clone(&log);
        let task = DownloadTask::with_callback(
            url,
            path,
            move |task, event, tag| {
                assert_eq!(*tag, "tag");
                sink.lock()
                    .unwrap()
                    .push((event, task.throughput(), task.downloaded()));
            },
            "tag",
        );
        (task, log)
    }

    #[test]
    fn test_new_task_derives_host_and_path() {
        let task = DownloadTask::new("http://a.b/c/d", "/tmp/d");
        assert_eq!(task.host(), "a.b");
        assert_eq!(task.resource_path(), "/c/d");
        assert_eq!(task.remote_length(), 0);
        assert_eq!(task.downloaded(), 0);
        assert!(!task.is_finished());
        assert!(task.headers().is_empty());
    }

    #[test]
    fn test_progress_events_carry_interval_throughput() {
        let (mut task, log) = recording_task("http://example.com/f", Path::new("/tmp/f"));
        let clock = ManualClock::new();
        let mut body = ScriptedBody::new(&clock)
            .burst(Duration::from_secs(1), &[1; 100])
            .burst(Duration::from_millis(300), &[2; 20])
            .burst(Duration::from_millis(700), &[3; 180]);
        let mut out = Vec::new();

        let written = copy_body(
            &mut body,
            &mut out,
            &clock,
            &mut task,
            &TransferConfig::default(),
            "http://example.com/f",
            Path::new("/tmp/f"),
        )
        .unwrap();

        assert_eq!(written, 300);
        assert_eq!(task.downloaded(), 300);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                (DownloadEvent::Progress, 100, 100),
                (DownloadEvent::Progress, 200, 300),
            ]
        );
    }

    #[test]
    fn test_emit_without_callback_is_noop() {
        let mut task = DownloadTask::new("http://example.com/f", "/tmp/f");
        task.on_sample(42);
        assert_eq!(task.throughput(), 42);
    }

    #[test]
    fn test_complete_destination_short_circuits_without_network() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("done.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        // Unresolvable host: any network attempt would fail the transfer
        let (mut task, log) = recording_task("http://nowhere.invalid/done.bin", &path);
        task.remote_length = 10;

        let outcome = task.try_transfer().unwrap();

        assert_eq!(outcome, TransferOutcome::AlreadyComplete);
        assert!(task.is_finished());
        assert_eq!(task.downloaded(), 10);
        assert_eq!(std::fs::read(&path).unwrap(), b"0123456789");
        assert_eq!(
            *log.lock().unwrap(),
            vec![(DownloadEvent::Finished, 0, 10)]
        );
    }

    #[test]
    fn test_cached_remote_size_skips_network() {
        let mut task = DownloadTask::new("http://nowhere.invalid/x", "/tmp/x");
        task.remote_length = 1234;
        assert_eq!(task.remote_size(), 1234);
    }

    #[test]
    fn test_unsupported_scheme_fails_before_network() {
        let dir = TempDir::new().unwrap();
        let mut task = DownloadTask::new("https://example.com/a", dir.path().join("a"));

        let err = task.try_transfer().unwrap_err();

        assert!(matches!(err, DownloadError::UnsupportedScheme { .. }), "{err}");
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert!(!task.transfer());
        assert_eq!(task.remote_size(), 0);
    }

    #[test]
    fn test_empty_host_is_invalid_url() {
        let mut task = DownloadTask::new("http:///path", "/tmp/p");
        let err = task.try_transfer().unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl { .. }), "{err}");
    }

    #[test]
    fn test_open_destination_append_and_rewrite() {
        use std::io::Write;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"stale").unwrap();

        open_destination(&path, false)
            .unwrap()
            .write_all(b"+more")
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"stale+more");

        open_destination(&path, true)
            .unwrap()
            .write_all(b"fresh")
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"fresh");
    }

    #[test]
    fn test_existing_size_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(existing_size(&dir.path().join("missing")).unwrap(), None);
    }
}
