//! One request end to end: resolve, fall back to probing, download, and
//! (for archives) extract and combine.
//!
//! Everything here is blocking; async callers run it on a blocking thread.
//! Cancellation is checked between phases, inside the probe workers and in
//! the download progress callback.

mod context;
mod select;
mod state;

pub use context::RequestContext;
pub use select::RenditionSelector;
pub use state::{FailureReason, RequestState, RequestTracker};

use std::collections::HashMap;
use std::sync::Arc;

use crate::archive::extract_members;
use crate::candidates::plan_targets;
use crate::config::VidripConfig;
use crate::error::RipError;
use crate::model::{sort_renditions, ContainerType, RenditionDescriptor, VideoId};
use crate::naming::AssetNaming;
use crate::probe::{ProbeOutcome, Prober};
use crate::progress::{percent, Phase, Progress, ProgressSink};
use crate::reassemble::{reassemble, single_file, ReconstructedAsset};
use crate::resolver::{MetadataResolver, RenditionCache};
use crate::retry::{run_with_retry, FetchError};
use crate::transport::{CurlTransport, GetOptions, Transport};

/// Where a rendition list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenditionSource {
    Cache,
    Manifest,
    Probe,
}

#[derive(Debug, Clone)]
pub struct Resolved {
    pub video_id: VideoId,
    /// Best first: descending height, then container name.
    pub renditions: Vec<RenditionDescriptor>,
    pub source: RenditionSource,
}

/// Shared engine. Holds configuration, the transport and the rendition cache;
/// all per-request state lives in [`RequestContext`] and [`RequestTracker`].
pub struct Engine {
    cfg: VidripConfig,
    transport: Arc<dyn Transport>,
    cache: RenditionCache,
}

impl Engine {
    pub fn new(cfg: VidripConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            cfg,
            transport,
            cache: RenditionCache::new(),
        }
    }

    /// Engine over libcurl, sending `headers` (cookies, auth) with every request.
    pub fn with_curl(cfg: VidripConfig, headers: HashMap<String, String>) -> Self {
        let transport = CurlTransport::new(cfg.connect_timeout()).with_headers(headers);
        Self::new(cfg, Arc::new(transport))
    }

    fn resolver(&self) -> MetadataResolver {
        MetadataResolver::new(
            Arc::clone(&self.transport),
            self.cfg.manifest_url.clone(),
            self.cfg.probe_timeout(),
        )
    }

    fn prober(&self) -> Prober {
        Prober::new(
            Arc::clone(&self.transport),
            self.cfg.probe_workers,
            self.cfg.probe_timeout(),
        )
    }

    /// Renditions for the request's video: cache, then manifest, then the
    /// hint-driven probe fallback.
    ///
    /// A manifest transport failure or an empty manifest triggers the
    /// fallback. When no hint is usable the manifest's resolution error is
    /// returned.
    pub fn resolve_renditions(&self, ctx: &RequestContext, progress: &ProgressSink) -> Result<Resolved, RipError> {
        let id = VideoId::parse(&ctx.video_id)?;
        if ctx.refresh {
            if self.cache.invalidate(&id) {
                tracing::debug!(video_id = %id, "cached renditions dropped");
            }
        } else if let Some(renditions) = self.cache.get(&id) {
            tracing::debug!(video_id = %id, count = renditions.len(), "renditions from cache");
            return Ok(Resolved {
                video_id: id,
                renditions,
                source: RenditionSource::Cache,
            });
        }
        ctx.cancel.check()?;

        progress.emit(Phase::Resolving, Progress::None, "fetching manifest");
        let resolution_error = match self.resolver().resolve(&id) {
            Ok(renditions) if !renditions.is_empty() => {
                self.cache.insert(id.clone(), renditions.clone());
                return Ok(Resolved {
                    video_id: id,
                    renditions,
                    source: RenditionSource::Manifest,
                });
            }
            Ok(_) => {
                tracing::info!(video_id = %id, "manifest lists no renditions; probing candidates");
                None
            }
            Err(e) if e.allows_fallback() => {
                tracing::info!(video_id = %id, error = %e, "manifest unavailable; probing candidates");
                Some(e)
            }
            Err(e) => return Err(e),
        };
        ctx.cancel.check()?;

        let plan = plan_targets(&ctx.hints, &self.cfg.cdn_host);
        if plan.targets.is_empty() {
            tracing::warn!(video_id = %id, hints = ctx.hints.len(), "no usable hint URL for fallback");
            return Err(resolution_error.unwrap_or(RipError::ProbeExhausted { tried: 0, skipped: 0 }));
        }
        if let Some(hint) = &plan.hint {
            if hint.base_id != id.as_str() {
                tracing::debug!(video_id = %id, base_id = %hint.base_id, "hint base id differs from video id");
            }
        }

        let outcome = self.prober().probe_all(plan.targets, &ctx.cancel, progress)?;
        let mut renditions = outcome.renditions();
        sort_renditions(&mut renditions);
        self.cache.insert(id.clone(), renditions.clone());
        Ok(Resolved {
            video_id: id,
            renditions,
            source: RenditionSource::Probe,
        })
    }

    /// Probes the request's hint URLs directly, skipping the manifest.
    pub fn probe_hints(&self, ctx: &RequestContext, progress: &ProgressSink) -> Result<ProbeOutcome, RipError> {
        let plan = plan_targets(&ctx.hints, &self.cfg.cdn_host);
        if plan.targets.is_empty() {
            return Err(RipError::input(
                ctx.hints.join(" "),
                "no hint URL under /video/ or image URL to derive candidates from",
            ));
        }
        self.prober().probe_all(plan.targets, &ctx.cancel, progress)
    }

    /// Downloads `rendition` and turns it into an asset. Archives go through
    /// extraction and reassembly; mp4 and audio pass straight through.
    pub fn fetch_asset(
        &self,
        ctx: &RequestContext,
        rendition: &RenditionDescriptor,
        tracker: &mut RequestTracker,
    ) -> Result<ReconstructedAsset, RipError> {
        if tracker.state().is_terminal() {
            tracker.restart();
        }
        let result = self.fetch_asset_inner(ctx, rendition, tracker);
        if let Err(e) = &result {
            tracker.fail(e);
        }
        result
    }

    fn fetch_asset_inner(
        &self,
        ctx: &RequestContext,
        rendition: &RenditionDescriptor,
        tracker: &mut RequestTracker,
    ) -> Result<ReconstructedAsset, RipError> {
        ctx.cancel.check()?;
        step(ctx, tracker, RequestState::Downloading { percent: None })?;
        let body = self.download(ctx, &rendition.url, tracker)?;
        ctx.cancel.check()?;

        let naming = AssetNaming::new(ctx.display_title(), rendition.label.clone(), self.cfg.max_title_chars);
        let asset = match rendition.container {
            ContainerType::Tar => {
                step(ctx, tracker, RequestState::Extracting)?;
                let listing = extract_members(&body, self.cfg.max_archive_bytes)?;
                ctx.cancel.check()?;
                step(ctx, tracker, RequestState::Combining)?;
                let mut asset = reassemble(&listing, &naming)?;
                if let Some(w) = listing.warning(&rendition.url) {
                    asset.warnings.push(w);
                }
                asset
            }
            ContainerType::Mp4 | ContainerType::Audio => single_file(body, rendition.container, &naming),
        };
        ctx.cancel.check()?;
        for w in &asset.warnings {
            tracing::warn!(file = %asset.suggested_filename, "{}", w);
        }
        step(ctx, tracker, RequestState::Done)?;
        Ok(asset)
    }

    fn download(&self, ctx: &RequestContext, url: &str, tracker: &mut RequestTracker) -> Result<Vec<u8>, RipError> {
        let policy = self.cfg.retry_policy();
        let opts = GetOptions {
            timeout: self.cfg.download_timeout(),
            max_bytes: self.cfg.max_archive_bytes,
        };
        let cancel = &ctx.cancel;
        let fetched = run_with_retry(&policy, cancel, |attempt| {
            if attempt > 1 {
                tracing::info!(%url, attempt, "retrying download");
            }
            let mut on_progress = |done: u64, total: Option<u64>| {
                if cancel.is_cancelled() {
                    return false;
                }
                match total {
                    Some(t) => {
                        let moved = tracker.advance(RequestState::Downloading {
                            percent: Some(percent(done, t)),
                        });
                        if !moved {
                            return false;
                        }
                    }
                    None => tracker.downloaded_bytes(done),
                }
                true
            };
            self.transport.get(url, opts, &mut on_progress)
        });
        match fetched {
            Ok(body) => {
                tracing::info!(%url, bytes = body.len(), "rendition downloaded");
                Ok(body)
            }
            Err(FetchError::Aborted) if cancel.is_cancelled() => Err(RipError::Cancelled),
            Err(e) => Err(RipError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Full request: resolve, pick a rendition, fetch it.
    ///
    /// A tracker left at `Done` or `Failed` by an earlier request is reset
    /// first. A tracker still running another request is refused.
    pub fn run(
        &self,
        ctx: &RequestContext,
        selector: &RenditionSelector,
        tracker: &mut RequestTracker,
    ) -> Result<ReconstructedAsset, RipError> {
        let span = tracing::info_span!("request", video_id = %ctx.video_id);
        let _enter = span.enter();

        if !tracker.begin() {
            return Err(RipError::input(
                ctx.video_id.as_str(),
                "tracker is still running another request",
            ));
        }
        step(ctx, tracker, RequestState::Resolving)?;
        let resolved = match self.resolve_renditions(ctx, tracker.sink()) {
            Ok(r) => r,
            Err(e) => {
                tracker.fail(&e);
                return Err(e);
            }
        };
        let rendition = match selector.select(&resolved.renditions) {
            Ok(r) => r.clone(),
            Err(e) => {
                tracker.fail(&e);
                return Err(e);
            }
        };
        tracing::info!(
            label = %rendition.label,
            container = %rendition.container,
            source = ?resolved.source,
            "rendition selected"
        );
        self.fetch_asset(ctx, &rendition, tracker)
    }
}

/// Advances `tracker`, turning a refused transition into an error.
fn step(ctx: &RequestContext, tracker: &mut RequestTracker, next: RequestState) -> Result<(), RipError> {
    if tracker.advance(next) {
        Ok(())
    } else {
        Err(RipError::input(
            ctx.video_id.as_str(),
            format!("request cannot move on from {:?}", tracker.state()),
        ))
    }
}
