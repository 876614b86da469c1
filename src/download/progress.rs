//! Progress notification types.

use super::task::DownloadTask;

/// Kinds of events delivered to a task's progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadEvent {
    /// Response head accepted and destination opened; the body is about to stream.
    Started,
    /// Periodic throughput sample. Read `throughput()` and `downloaded()` from the task.
    Progress,
    /// The destination holds the complete file.
    Finished,
}

/// Callback invoked synchronously from inside the transfer.
///
/// Receives the task (for reading counters), the event kind and the task's
/// user data. The transfer loop is blocked until it returns.
pub type ProgressCallback<U> = Box<dyn FnMut(&DownloadTask<U>, DownloadEvent, &U) + Send>;
