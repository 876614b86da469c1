//! rangeget Core Library
//!
//! A resumable, single-connection HTTP/1.1 file downloader. Given a remote
//! `http://` URL and a local path, a [`DownloadTask`] determines the remote
//! size, resumes a partial file with a byte-range request, streams the body
//! to disk and reports throughput through a callback.
//!
//! # Architecture
//!
//! - [`download`] - URL splitting, request/response handling, the transfer
//!   engine and progress events
//!
//! Everything is blocking and single-threaded per task. Run tasks on their
//! own threads to download several files at once.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod download;

// Re-export commonly used types
pub use download::{
    DownloadError, DownloadEvent, DownloadTask, ErrorKind, Header, TransferConfig,
    TransferOutcome, parse_url,
};
