//! Resumable HTTP/1.1 download engine over plain TCP.
//!
//! A [`DownloadTask`] owns one remote URL and one destination file. It can
//! query the remote size, and transfer the body into the destination,
//! resuming from whatever is already on disk with a byte-range request.
//!
//! # Features
//!
//! - Hand-built `GET` requests with `Host`, `RANGE`, `Accept` and `Connection: Close`
//! - Status-line and header parsing with the raw header list kept per response
//! - Append on `206`, rewrite on `200` after a resume attempt
//! - Throughput sampled per transfer and pushed to an optional callback
//! - Structured errors ([`DownloadError`]) classified by [`ErrorKind`]
//!
//! # Example
//!
//! ```no_run
//! use rangeget::download::DownloadTask;
//!
//! let mut task = DownloadTask::new("http://example.com/data.bin", "data.bin");
//! println!("remote size: {}", task.remote_size());
//! if task.transfer() {
//!     println!("downloaded {} bytes", task.downloaded());
//! }
//! ```

mod client;
mod config;
mod constants;
mod engine;
mod error;
mod http;
mod progress;
mod task;
mod url;

pub use config::TransferConfig;
pub use constants::{HTTP_PORT, RANGE_HEADER};
pub use error::{DownloadError, ErrorKind};
pub use http::{
    Header, ResponseHead, StatusLine, build_request, find_header, is_head_terminator,
    parse_header_line, parse_status_line,
};
pub use progress::{DownloadEvent, ProgressCallback};
pub use task::{DownloadTask, TransferOutcome};
pub use url::{ResourceLocation, foreign_scheme, parse_url, split_host_port};
