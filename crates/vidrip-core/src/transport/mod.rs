//! The narrow HTTP capability the engine needs: HEAD, a one-byte ranged GET,
//! and a bounded whole-body GET.
//!
//! [`CurlTransport`] is the production implementation. Everything above this
//! module talks to `dyn Transport`, so tests substitute a scripted double.

mod http;
mod parse;

#[cfg(test)]
pub(crate) mod mock;

use std::time::Duration;

use crate::retry::FetchError;

pub use http::CurlTransport;
pub use parse::parse_headers;

/// Parsed response head of the final response (after redirects).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u32,
    /// `Content-Length`, if present.
    pub content_length: Option<u64>,
    /// Total size from `Content-Range: bytes a-b/TOTAL`, if present and known.
    pub range_total: Option<u64>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best guess at the full resource size.
    pub fn total_size(&self) -> Option<u64> {
        if self.status == 206 {
            self.range_total
        } else {
            self.content_length.or(self.range_total)
        }
    }
}

/// Limits for a whole-body GET.
#[derive(Debug, Clone, Copy)]
pub struct GetOptions {
    pub timeout: Duration,
    /// Bodies larger than this are refused with [`FetchError::TooLarge`].
    pub max_bytes: u64,
}

/// Called with (bytes received, total if known); return `false` to abort.
pub type ProgressFn<'a> = dyn FnMut(u64, Option<u64>) -> bool + 'a;

/// HTTP operations used by the resolver, prober and downloader.
///
/// Implementations must be safe to call from several probe workers at once.
/// Every call must be bounded by the given timeout.
pub trait Transport: Send + Sync {
    /// HEAD request. Non-2xx statuses are returned, not turned into errors.
    fn head(&self, url: &str, timeout: Duration) -> Result<ResponseHead, FetchError>;

    /// GET of `Range: bytes=0-0`. Non-2xx statuses are returned, not errors.
    fn probe_range(&self, url: &str, timeout: Duration) -> Result<ResponseHead, FetchError>;

    /// Whole-body GET returning the body. Non-2xx statuses are
    /// [`FetchError::Http`].
    fn get(
        &self,
        url: &str,
        opts: GetOptions,
        progress: &mut ProgressFn<'_>,
    ) -> Result<Vec<u8>, FetchError>;
}
