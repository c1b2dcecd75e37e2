//! Request state machine shown to the presentation layer.
//!
//! `Idle -> Resolving -> Downloading -> Extracting -> Combining -> Done`.
//! Single-file renditions go `Downloading -> Done`. Any active state may go
//! to `Failed`. `Done` and `Failed` stay put until [`RequestTracker::restart`].

use std::fmt;

use crate::error::RipError;
use crate::progress::{Phase, Progress, ProgressSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Resolving,
    Downloading { percent: Option<u8> },
    Extracting,
    Combining,
    Done,
    Failed(FailureReason),
}

/// Short, user-facing description of why a request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReason {
    pub phase: Phase,
    pub message: String,
    /// Offending URL or identifier, when known.
    pub subject: Option<String>,
    pub cancelled: bool,
}

impl FailureReason {
    pub fn from_error(phase: Phase, err: &RipError) -> Self {
        Self {
            phase,
            message: err.to_string(),
            subject: err.subject().map(str::to_string),
            cancelled: matches!(err, RipError::Cancelled),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.phase, self.message)
    }
}

impl RequestState {
    pub fn phase(&self) -> Option<Phase> {
        match self {
            RequestState::Idle => None,
            RequestState::Resolving => Some(Phase::Resolving),
            RequestState::Downloading { .. } => Some(Phase::Downloading),
            RequestState::Extracting => Some(Phase::Extracting),
            RequestState::Combining => Some(Phase::Combining),
            RequestState::Done => Some(Phase::Done),
            RequestState::Failed(_) => Some(Phase::Failed),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RequestState::Resolving
                | RequestState::Downloading { .. }
                | RequestState::Extracting
                | RequestState::Combining
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Done | RequestState::Failed(_))
    }

    fn can_advance_to(&self, next: &RequestState) -> bool {
        use RequestState::*;
        match (self, next) {
            (_, Failed(_)) => self.is_active(),
            (Idle, Resolving | Downloading { .. }) => true,
            (Resolving, Downloading { .. }) => true,
            (Downloading { .. }, Downloading { .. } | Extracting | Done) => true,
            (Extracting, Combining) => true,
            (Combining, Done) => true,
            _ => false,
        }
    }
}

/// Current state of one request plus the sink it reports to.
#[derive(Debug)]
pub struct RequestTracker {
    state: RequestState,
    sink: ProgressSink,
}

impl RequestTracker {
    pub fn new(sink: ProgressSink) -> Self {
        Self {
            state: RequestState::Idle,
            sink,
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn sink(&self) -> &ProgressSink {
        &self.sink
    }

    /// Moves to `next` and emits an event. Illegal transitions are refused
    /// (returns false) and leave the state unchanged.
    pub fn advance(&mut self, next: RequestState) -> bool {
        if !self.state.can_advance_to(&next) {
            tracing::warn!(from = ?self.state, to = ?next, "refused state transition");
            return false;
        }
        let repeat = matches!(
            (&self.state, &next),
            (RequestState::Downloading { percent: a }, RequestState::Downloading { percent: b }) if a == b
        );
        self.state = next;
        if !repeat {
            self.emit();
        }
        true
    }

    /// Records a byte count during a download whose total size is unknown.
    pub fn downloaded_bytes(&self, bytes: u64) {
        if matches!(self.state, RequestState::Downloading { .. }) {
            self.sink.emit(Phase::Downloading, Progress::Bytes(bytes), "downloading");
        }
    }

    /// Moves an active request to `Failed`. No-op once terminal.
    pub fn fail(&mut self, err: &RipError) {
        let Some(phase) = self.state.phase().filter(|_| self.state.is_active()) else {
            return;
        };
        let reason = FailureReason::from_error(phase, err);
        tracing::info!(%reason, subject = ?reason.subject, "request failed");
        self.state = RequestState::Failed(reason);
        self.emit();
    }

    /// Back to `Idle` for a new request.
    pub fn restart(&mut self) {
        self.state = RequestState::Idle;
    }

    /// Readies the tracker for a new request. A finished tracker goes back to
    /// `Idle`; one still in an active state is refused (returns false).
    pub fn begin(&mut self) -> bool {
        if self.state.is_active() {
            tracing::warn!(state = ?self.state, "tracker is still running a request");
            return false;
        }
        self.restart();
        true
    }

    fn emit(&self) {
        let (phase, progress, status) = match &self.state {
            RequestState::Idle => return,
            RequestState::Resolving => (Phase::Resolving, Progress::None, "resolving renditions".to_string()),
            RequestState::Downloading { percent } => (
                Phase::Downloading,
                percent.map(Progress::Percent).unwrap_or(Progress::None),
                "downloading".to_string(),
            ),
            RequestState::Extracting => (Phase::Extracting, Progress::None, "extracting archive".to_string()),
            RequestState::Combining => (Phase::Combining, Progress::None, "combining segments".to_string()),
            RequestState::Done => (Phase::Done, Progress::Percent(100), "done".to_string()),
            RequestState::Failed(reason) => (Phase::Failed, Progress::None, reason.to_string()),
        };
        self.sink.emit(phase, progress, status);
    }
}
