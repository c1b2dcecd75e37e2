//! Progress notifications: the only coupling point to a user interface.
//!
//! Events are pushed with `try_send` on a bounded channel, so a slow or
//! absent consumer never stalls the engine; dropped events are acceptable.

use std::fmt;

/// Phase an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolving,
    Probing,
    Downloading,
    Extracting,
    Combining,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Resolving => "resolving",
            Phase::Probing => "probing",
            Phase::Downloading => "downloading",
            Phase::Extracting => "extracting",
            Phase::Combining => "combining",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    None,
    Percent(u8),
    Count { done: usize, total: usize },
    /// Byte count when the total size is unknown.
    Bytes(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub progress: Progress,
    pub status: String,
}

/// Sending half handed to the engine. `ProgressSink::none()` discards everything.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<tokio::sync::mpsc::Sender<ProgressEvent>>,
}

impl ProgressSink {
    pub fn new(tx: tokio::sync::mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn emit(&self, phase: Phase, progress: Progress, status: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(ProgressEvent {
                phase,
                progress,
                status: status.into(),
            });
        }
    }
}

/// Percentage in [0, 100] of `done` out of `total` (100 when `total` is 0).
pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) as u128 * 100) / total as u128) as u8
}
