//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use rangeget::{TransferConfig, parse_url};

/// File name used when the URL path has no last segment.
const DEFAULT_FILE_NAME: &str = "index.html";

/// Resumable single-connection HTTP downloader.
///
/// Downloads an http:// URL to a local file. If the file already exists the
/// download resumes from its current size.
#[derive(Parser, Debug)]
#[command(name = "rangeget")]
#[command(author, version, about)]
pub struct Args {
    /// URL to download (http:// only)
    pub url: String,

    /// Destination file (defaults to the last segment of the URL path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the remote size in bytes and exit
    #[arg(long)]
    pub size_only: bool,

    /// Connect timeout in seconds (0 to wait indefinitely)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=3600))]
    pub connect_timeout: u64,

    /// Read timeout in seconds (0 to wait indefinitely)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=86400))]
    pub read_timeout: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Destination path: `--output`, else the URL's last path segment.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(file_name_from_url(&self.url)))
    }

    /// Transfer configuration from the timeout flags.
    pub fn transfer_config(&self) -> TransferConfig {
        let mut config = TransferConfig::default();
        if self.connect_timeout > 0 {
            config = config.with_connect_timeout(Duration::from_secs(self.connect_timeout));
        }
        if self.read_timeout > 0 {
            config = config.with_read_timeout(Duration::from_secs(self.read_timeout));
        }
        config
    }
}

fn file_name_from_url(url: &str) -> String {
    let location = parse_url(url);
    let path = location
        .path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_FILE_NAME.to_string(),
    }
}
