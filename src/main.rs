//! CLI entry point for rangeget.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use rangeget::{DownloadEvent, DownloadTask, TransferOutcome};
use tracing::{debug, info};

mod cli;

use cli::Args;

fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let output = args.output_path();
    let config = args.transfer_config();

    if args.size_only {
        let mut task = DownloadTask::new(&args.url, &output).with_config(config);
        let size = task
            .try_remote_size()
            .with_context(|| format!("querying size of {}", args.url))?;
        println!("{size}");
        return Ok(());
    }

    let bar = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut task =
        DownloadTask::with_callback(&args.url, &output, render_progress, bar.clone())
            .with_config(config);

    info!(url = %args.url, path = %output.display(), "starting download");
    let outcome = task.try_transfer().inspect_err(|_| bar.abandon());
    let outcome = outcome.with_context(|| {
        format!(
            "downloading {} ({} bytes on disk, run again to resume)",
            args.url,
            task.downloaded()
        )
    })?;

    match outcome {
        TransferOutcome::AlreadyComplete => info!(path = %output.display(), "already complete"),
        TransferOutcome::Completed {
            bytes_written,
            resumed_from,
            restarted,
        } => info!(
            path = %output.display(),
            bytes_written,
            resumed_from,
            restarted,
            "download complete"
        ),
    }

    Ok(())
}

fn render_progress(task: &DownloadTask<ProgressBar>, event: DownloadEvent, bar: &ProgressBar) {
    match event {
        DownloadEvent::Started => {
            if let Some(remaining) = task.content_length() {
                bar.set_length(task.downloaded() + remaining);
            } else if task.remote_length() > 0 {
                bar.set_length(task.remote_length());
            }
            bar.set_position(task.downloaded());
        }
        DownloadEvent::Progress => {
            bar.set_position(task.downloaded());
            bar.set_message(format!("{}/s", HumanBytes(task.throughput())));
        }
        DownloadEvent::Finished => {
            bar.set_position(task.downloaded());
            bar.finish_with_message("done");
        }
    }
}
