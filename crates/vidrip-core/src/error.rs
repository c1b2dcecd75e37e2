//! Error taxonomy for resolution, probing and reconstruction.
//!
//! `RipError` is what a request fails with; `Warning` is what a successful
//! request may carry along (missing segments, a possibly truncated archive).

use std::fmt;

/// Terminal failure of one phase of a request.
#[derive(Debug, thiserror::Error)]
pub enum RipError {
    /// Missing or malformed video identifier, or a selection that matches nothing.
    #[error("invalid input {id:?}: {reason}")]
    Input { id: String, reason: String },

    /// The manifest endpoint could not be reached or answered with an error status.
    #[error("manifest fetch failed for {url}: {reason}")]
    Resolution { url: String, reason: String },

    /// Unparseable manifest, archive or playlist, or an ambiguous playlist count.
    #[error("malformed {source_name}: {reason}")]
    Format { source_name: String, reason: String },

    /// Fallback probing ran but no candidate was ever confirmed reachable.
    #[error("no candidate confirmed reachable ({tried} probed, {skipped} skipped)")]
    ProbeExhausted { tried: usize, skipped: usize },

    /// The rendition body could not be downloaded (after retries).
    #[error("download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("cancelled")]
    Cancelled,
}

impl RipError {
    pub fn format(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        RipError::Format {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn input(id: impl Into<String>, reason: impl Into<String>) -> Self {
        RipError::Input {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// URL (or archive/playlist name) the error is about, when there is one.
    pub fn subject(&self) -> Option<&str> {
        match self {
            RipError::Input { id, .. } => Some(id),
            RipError::Resolution { url, .. } | RipError::Download { url, .. } => Some(url),
            RipError::Format { source_name, .. } => Some(source_name),
            RipError::ProbeExhausted { .. } | RipError::Cancelled => None,
        }
    }

    /// True for errors that should trigger the candidate fallback path.
    pub fn allows_fallback(&self) -> bool {
        matches!(self, RipError::Resolution { .. })
    }
}

/// Non-fatal problem attached to a finished asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Playlist referenced segments that were not in the archive; they were skipped.
    PartialContent { missing: Vec<String> },
    /// The archive had a malformed size field or ended mid-member.
    PossiblyTruncated { archive: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::PartialContent { missing } => {
                write!(f, "{} referenced segment(s) missing", missing.len())?;
                if let Some(first) = missing.first() {
                    write!(f, " (first: {})", first)?;
                }
                Ok(())
            }
            Warning::PossiblyTruncated { archive } => {
                write!(f, "archive {} may be truncated or corrupt", archive)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_resolution_errors_fall_back() {
        let res = RipError::Resolution {
            url: "https://api.example.com/v".into(),
            reason: "connection refused".into(),
        };
        assert!(res.allows_fallback());
        assert!(!RipError::format("manifest", "not an object").allows_fallback());
        assert!(!RipError::input("", "empty").allows_fallback());
        assert!(!RipError::Cancelled.allows_fallback());
    }

    #[test]
    fn subject_points_at_offending_url() {
        let e = RipError::Download {
            url: "https://cdn.example.com/a.tar".into(),
            reason: "HTTP 404".into(),
        };
        assert_eq!(e.subject(), Some("https://cdn.example.com/a.tar"));
        assert_eq!(RipError::Cancelled.subject(), None);
    }

    #[test]
    fn partial_content_warning_names_first_missing() {
        let w = Warning::PartialContent {
            missing: vec!["seg2.ts".into(), "seg5.ts".into()],
        };
        assert_eq!(w.to_string(), "2 referenced segment(s) missing (first: seg2.ts)");
    }
}
