//! Liveness check for one URL: HEAD, or a one-byte ranged GET when the host
//! refuses HEAD.

use std::time::Duration;

use crate::model::{CandidateTarget, ProbeResult};
use crate::transport::Transport;

/// Statuses some CDNs return for HEAD while serving GET fine.
const HEAD_REFUSED: [u32; 3] = [403, 405, 501];

fn unreachable(url: &str) -> ProbeResult {
    ProbeResult {
        url: url.to_string(),
        reachable: false,
        size_bytes: None,
    }
}

/// Checks one URL. Transport errors (including timeouts) count as unreachable.
pub fn check_url(transport: &dyn Transport, url: &str, timeout: Duration) -> ProbeResult {
    let head = match transport.head(url, timeout) {
        Ok(h) => h,
        Err(e) => {
            tracing::debug!(%url, error = %e, "HEAD probe failed");
            return unreachable(url);
        }
    };
    if head.is_success() {
        return ProbeResult {
            url: url.to_string(),
            reachable: true,
            size_bytes: head.total_size(),
        };
    }
    if !HEAD_REFUSED.contains(&head.status) {
        return unreachable(url);
    }

    match transport.probe_range(url, timeout) {
        Ok(h) if h.is_success() => ProbeResult {
            url: url.to_string(),
            reachable: true,
            size_bytes: h.total_size(),
        },
        Ok(h) => {
            tracing::trace!(%url, status = h.status, "range probe rejected");
            unreachable(url)
        }
        Err(e) => {
            tracing::debug!(%url, error = %e, "range probe failed");
            unreachable(url)
        }
    }
}

/// Checks a target and, when `fold` is set, once more with the token's case
/// flipped. The returned result carries whichever URL answered.
pub fn probe_target(transport: &dyn Transport, target: &CandidateTarget, timeout: Duration, fold: bool) -> ProbeResult {
    let first = check_url(transport, &target.url, timeout);
    if first.reachable || !fold {
        return first;
    }
    match target.case_folded() {
        Some(folded) => {
            let second = check_url(transport, &folded.url, timeout);
            if second.reachable {
                tracing::debug!(url = %folded.url, "reachable after case fold");
                second
            } else {
                first
            }
        }
        None => first,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CaseVariant, ContainerType, Origin, QualityToken};
    use crate::transport::mock::{MockRoute, MockTransport};

    const T: Duration = Duration::from_secs(1);

    #[test]
    fn head_success_reports_size() {
        let mock = MockTransport::new().body("https://c/x.tar", b"12345");
        let r = check_url(&mock, "https://c/x.tar", T);
        assert!(r.reachable);
        assert_eq!(r.size_bytes, Some(5));
        assert_eq!(mock.calls(), vec!["HEAD https://c/x.tar"]);
    }

    #[test]
    fn refused_head_falls_back_to_range() {
        let mock = MockTransport::new().body("https://c/x.tar", b"123").reject_head();
        let r = check_url(&mock, "https://c/x.tar", T);
        assert!(r.reachable);
        assert_eq!(r.size_bytes, Some(3));
        assert_eq!(mock.calls(), vec!["HEAD https://c/x.tar", "RANGE https://c/x.tar"]);
    }

    #[test]
    fn not_found_does_not_range_probe() {
        let mock = MockTransport::new();
        let r = check_url(&mock, "https://c/missing.tar", T);
        assert!(!r.reachable);
        assert_eq!(mock.calls().len(), 1);
    }

    #[test]
    fn timeout_is_unreachable() {
        let mock = MockTransport::new().route("https://c/slow.tar", MockRoute::Timeout);
        assert!(!check_url(&mock, "https://c/slow.tar", T).reachable);
    }

    fn lower_hd_target() -> CandidateTarget {
        CandidateTarget {
            url: "https://c/video/p/id.hd.tar".into(),
            container: ContainerType::Tar,
            quality: QualityToken::lookup("hd").unwrap(),
            case_variant: CaseVariant::Lower,
            live: false,
            origin: Origin::Generated,
            priority: 0,
        }
    }

    #[test]
    fn case_fold_retry_finds_uppercase_file() {
        let mock = MockTransport::new().body("https://c/video/p/id.HD.tar", b"x");
        let r = probe_target(&mock, &lower_hd_target(), T, true);
        assert!(r.reachable);
        assert_eq!(r.url, "https://c/video/p/id.HD.tar");
    }

    #[test]
    fn fold_disabled_makes_one_request() {
        let mock = MockTransport::new().body("https://c/video/p/id.HD.tar", b"x");
        let r = probe_target(&mock, &lower_hd_target(), T, false);
        assert!(!r.reachable);
        assert_eq!(mock.calls(), vec!["HEAD https://c/video/p/id.hd.tar"]);
    }
}
