//! Transport-level error returned by [`crate::transport::Transport`] calls.

use std::fmt;

/// Failure of a single HTTP exchange.
#[derive(Debug)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, DNS, ...).
    Curl(curl::Error),
    /// The server answered with a non-2xx status.
    Http(u32),
    /// The body grew past the in-memory ceiling; the transfer was stopped.
    TooLarge { limit: u64 },
    /// The caller's progress callback asked to stop (cancellation).
    Aborted,
    /// Per-request time budget exhausted (used by transports that time out
    /// outside curl, and by test doubles).
    Timeout,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Curl(e) => write!(f, "{}", e),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
            FetchError::TooLarge { limit } => {
                write!(f, "response body exceeds {} bytes", limit)
            }
            FetchError::Aborted => write!(f, "transfer aborted"),
            FetchError::Timeout => write!(f, "request timed out"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Curl(e) => Some(e),
            _ => None,
        }
    }
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        FetchError::Curl(e)
    }
}
