//! Bounded-concurrency liveness check for candidate URLs.
//!
//! Workers pull from one shared queue in priority order. Once a
//! (token, container) key is confirmed, queued targets with that key are
//! skipped without a request; targets already in flight finish and the
//! lower-priority confirmation wins. A target is retried with its token case
//! flipped only when that URL is not itself in the batch.

mod check;

pub use check::{check_url, probe_target};

use std::collections::{HashSet, VecDeque};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::control::CancelToken;
use crate::error::RipError;
use crate::model::{CandidateTarget, ProbeKey, ProbeResult, RenditionDescriptor};
use crate::progress::{Phase, Progress, ProgressSink};

/// What one prober run produced.
#[derive(Debug, Clone, Default)]
pub struct ProbeOutcome {
    /// Confirmed targets, priority order, one per key.
    pub confirmed: Vec<(CandidateTarget, ProbeResult)>,
    /// Targets actually probed.
    pub tried: usize,
    /// Targets dropped because their key was already confirmed.
    pub skipped: usize,
}

impl ProbeOutcome {
    pub fn renditions(&self) -> Vec<RenditionDescriptor> {
        self.confirmed
            .iter()
            .map(|(target, result)| RenditionDescriptor::from_probe(target, result))
            .collect()
    }
}

enum WorkerMsg {
    Probed(CandidateTarget, ProbeResult),
    Skipped,
}

pub struct Prober {
    transport: Arc<dyn crate::transport::Transport>,
    workers: usize,
    timeout: Duration,
}

impl Prober {
    pub fn new(transport: Arc<dyn crate::transport::Transport>, workers: usize, timeout: Duration) -> Self {
        Self {
            transport,
            workers: workers.max(1),
            timeout,
        }
    }

    /// Probes `targets` and returns the confirmed ones.
    ///
    /// Fails with [`RipError::Cancelled`] if `cancel` fires before the run
    /// finishes (in-flight results are discarded), and with
    /// [`RipError::ProbeExhausted`] when nothing was confirmed.
    pub fn probe_all(
        &self,
        targets: Vec<CandidateTarget>,
        cancel: &CancelToken,
        progress: &ProgressSink,
    ) -> Result<ProbeOutcome, RipError> {
        cancel.check()?;
        let total = targets.len();
        if total == 0 {
            return Err(RipError::ProbeExhausted { tried: 0, skipped: 0 });
        }

        let mut sorted = targets;
        sorted.sort_by_key(|t| t.priority);
        let queued: HashSet<&str> = sorted.iter().map(|t| t.url.as_str()).collect();
        let queue: VecDeque<(CandidateTarget, bool)> = sorted
            .iter()
            .map(|t| {
                let fold = t.case_folded().is_some_and(|f| !queued.contains(f.url.as_str()));
                (t.clone(), fold)
            })
            .collect();
        let work: Arc<Mutex<VecDeque<(CandidateTarget, bool)>>> = Arc::new(Mutex::new(queue));
        let confirmed_keys: Arc<Mutex<HashSet<ProbeKey>>> = Arc::new(Mutex::new(HashSet::new()));
        let (tx, rx) = mpsc::channel();
        let num_workers = self.workers.min(total);
        tracing::debug!(targets = total, workers = num_workers, "probing candidates");

        let mut handles = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let work = Arc::clone(&work);
            let confirmed_keys = Arc::clone(&confirmed_keys);
            let tx = tx.clone();
            let cancel = cancel.clone();
            let transport = Arc::clone(&self.transport);
            let timeout = self.timeout;
            handles.push(std::thread::spawn(move || loop {
                if cancel.is_cancelled() {
                    break;
                }
                let (target, fold) = match work.lock().unwrap_or_else(PoisonError::into_inner).pop_front() {
                    Some(next) => next,
                    None => break,
                };
                let already = confirmed_keys
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .contains(&target.key());
                if already {
                    let _ = tx.send(WorkerMsg::Skipped);
                    continue;
                }
                let result = probe_target(transport.as_ref(), &target, timeout, fold);
                if result.reachable {
                    confirmed_keys
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(target.key());
                }
                let _ = tx.send(WorkerMsg::Probed(target, result));
            }));
        }
        drop(tx);

        let mut outcome = ProbeOutcome::default();
        let mut hits: Vec<(CandidateTarget, ProbeResult)> = Vec::new();
        for msg in rx {
            match msg {
                WorkerMsg::Probed(target, result) => {
                    outcome.tried += 1;
                    if result.reachable {
                        tracing::info!(url = %result.url, size = ?result.size_bytes, "candidate confirmed");
                        hits.push((target, result));
                    }
                }
                WorkerMsg::Skipped => outcome.skipped += 1,
            }
            progress.emit(
                Phase::Probing,
                Progress::Count {
                    done: outcome.tried + outcome.skipped,
                    total,
                },
                format!("{} confirmed", hits.len()),
            );
        }
        for h in handles {
            if h.join().is_err() {
                tracing::warn!("probe worker panicked");
            }
        }

        if cancel.is_cancelled() {
            tracing::info!(tried = outcome.tried, "probing cancelled");
            return Err(RipError::Cancelled);
        }

        hits.sort_by_key(|(t, _)| t.priority);
        let mut seen: HashSet<ProbeKey> = HashSet::new();
        outcome.confirmed = hits.into_iter().filter(|(t, _)| seen.insert(t.key())).collect();
        if outcome.confirmed.is_empty() {
            return Err(RipError::ProbeExhausted {
                tried: outcome.tried,
                skipped: outcome.skipped,
            });
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::plan_targets;
    use crate::model::ContainerType;
    use crate::transport::mock::{MockRoute, MockTransport};

    const HOST: &str = "https://cdn.example.com";

    fn hints() -> Vec<String> {
        vec![format!("{}/video/ab/cd/abc123.sd.m3u8", HOST)]
    }

    #[test]
    fn confirms_one_target_per_key() {
        let mock = MockTransport::new()
            .body("https://cdn.example.com/video/ab/cd/abc123.hd.tar", b"tar-bytes")
            .body("https://cdn.example.com/video/ab/cd/abc123.HD.tar", b"tar-bytes")
            .body("https://cdn.example.com/video/ab/cd/abc123.sd.mp4", b"mp4");
        let plan = plan_targets(&hints(), HOST);
        let prober = Prober::new(Arc::new(mock), 4, Duration::from_secs(1));
        let outcome = prober
            .probe_all(plan.targets, &CancelToken::new(), &ProgressSink::none())
            .unwrap();

        let labels: Vec<(&str, ContainerType)> = outcome
            .confirmed
            .iter()
            .map(|(t, _)| (t.quality.label, t.container))
            .collect();
        assert_eq!(labels, vec![("720p", ContainerType::Tar), ("480p", ContainerType::Mp4)]);
        assert_eq!(outcome.confirmed[0].0.url, "https://cdn.example.com/video/ab/cd/abc123.hd.tar");
        assert_eq!(outcome.confirmed[0].1.size_bytes, Some(9));
        assert_eq!(outcome.tried + outcome.skipped, 30);
    }

    #[test]
    fn single_worker_skips_confirmed_key_without_probing() {
        let mock = Arc::new(
            MockTransport::new()
                .body("https://cdn.example.com/video/ab/cd/abc123.hd.tar", b"x")
                .body("https://cdn.example.com/video/ab/cd/abc123.HD.tar", b"x"),
        );
        let plan = plan_targets(&hints(), HOST);
        let prober = Prober::new(mock.clone(), 1, Duration::from_secs(1));
        let outcome = prober
            .probe_all(plan.targets, &CancelToken::new(), &ProgressSink::none())
            .unwrap();
        assert_eq!(outcome.confirmed.len(), 1);
        assert!(outcome.skipped >= 1);
        let calls = mock.calls();
        assert!(!calls.iter().any(|c| c == "HEAD https://cdn.example.com/video/ab/cd/abc123.HD.tar"));
    }

    #[test]
    fn timed_out_target_fails_alone() {
        let slow = "https://cdn.example.com/video/ab/cd/abc123.hd.tar";
        let mock = Arc::new(
            MockTransport::new()
                .route(slow, MockRoute::Timeout)
                .body("https://cdn.example.com/video/ab/cd/abc123.sd.mp4", b"mp4"),
        );
        let plan = plan_targets(&hints(), HOST);
        let prober = Prober::new(mock.clone(), 3, Duration::from_secs(1));
        let outcome = prober
            .probe_all(plan.targets, &CancelToken::new(), &ProgressSink::none())
            .unwrap();

        let urls: Vec<&str> = outcome.confirmed.iter().map(|(_, r)| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://cdn.example.com/video/ab/cd/abc123.sd.mp4"]);
        assert_eq!(outcome.tried + outcome.skipped, 30);
        let head = format!("HEAD {}", slow);
        assert_eq!(mock.calls().iter().filter(|c| **c == head).count(), 1);
    }

    #[test]
    fn nothing_reachable_is_exhausted() {
        let plan = plan_targets(&hints(), HOST);
        let prober = Prober::new(Arc::new(MockTransport::new()), 6, Duration::from_secs(1));
        let err = prober
            .probe_all(plan.targets, &CancelToken::new(), &ProgressSink::none())
            .unwrap_err();
        assert!(matches!(err, RipError::ProbeExhausted { tried: 30, skipped: 0 }));
    }

    #[test]
    fn cancel_mid_probe_stops_dispatch() {
        let cancel = CancelToken::new();
        let hook_cancel = cancel.clone();
        let mock = Arc::new(
            MockTransport::new()
                .body("https://cdn.example.com/video/ab/cd/abc123.sd.mp4", b"x")
                .on_probe(move |_| hook_cancel.cancel()),
        );
        let plan = plan_targets(&hints(), HOST);
        let prober = Prober::new(mock.clone(), 1, Duration::from_secs(1));
        let err = prober
            .probe_all(plan.targets, &cancel, &ProgressSink::none())
            .unwrap_err();
        assert!(matches!(err, RipError::Cancelled));
        // Only the first target ran; nothing else was dispatched.
        assert_eq!(mock.calls().len(), 1);
    }

    #[test]
    fn empty_input_is_exhausted() {
        let prober = Prober::new(Arc::new(MockTransport::new()), 2, Duration::from_secs(1));
        let err = prober
            .probe_all(Vec::new(), &CancelToken::new(), &ProgressSink::none())
            .unwrap_err();
        assert!(matches!(err, RipError::ProbeExhausted { tried: 0, skipped: 0 }));
    }
}
