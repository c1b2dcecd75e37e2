//! Fallback URL synthesis.
//!
//! Given the structural parts of one observed asset URL, [`generate`] lists
//! every plausible rendition URL on the CDN in a fixed order. It is pure: no
//! network, no randomness, same input -> same list.

mod hint;

use crate::model::{CandidateTarget, CaseVariant, ContainerType, Origin, QUALITY_TOKENS};

pub use hint::{
    classify_hint, plan_targets, AssetHint, ClassifiedHint, HintKind, Liveness, TargetPlan,
};

/// One (container, live-suffix) group of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    LiveTar,
    Tar,
    Mp4,
}

impl Bucket {
    fn container(self) -> ContainerType {
        match self {
            Bucket::LiveTar | Bucket::Tar => ContainerType::Tar,
            Bucket::Mp4 => ContainerType::Mp4,
        }
    }

    fn live(self) -> bool {
        self == Bucket::LiveTar
    }
}

fn buckets_for(liveness: Liveness) -> &'static [Bucket] {
    match liveness {
        Liveness::Live => &[Bucket::LiveTar],
        Liveness::Vod => &[Bucket::Tar, Bucket::Mp4],
        Liveness::Unknown => &[Bucket::LiveTar, Bucket::Tar, Bucket::Mp4],
    }
}

/// Number of targets [`generate`] produces for a hint of this liveness.
pub fn expected_len(liveness: Liveness) -> usize {
    buckets_for(liveness).len() * QUALITY_TOKENS.len() * 2
}

/// `{host}/video/{path_part}/{base_id}.{token}{.rec?}.{ext}`
pub fn candidate_url(
    host: &str,
    path_part: &str,
    base_id: &str,
    token: &str,
    live: bool,
    container: ContainerType,
) -> String {
    format!(
        "{}/video/{}/{}.{}{}.{}",
        host.trim_end_matches('/'),
        path_part.trim_matches('/'),
        base_id,
        token,
        if live { ".rec" } else { "" },
        container.url_extension()
    )
}

/// Full ordered candidate list for one hint.
///
/// Order: live tar, then plain tar, then mp4; inside a bucket by descending
/// quality rank; lowercase token before uppercase. `priority` is the index.
pub fn generate(hint: &AssetHint, host: &str) -> Vec<CandidateTarget> {
    let origin = match hint.kind {
        HintKind::Asset => Origin::Generated,
        HintKind::Image => Origin::ImageDerived,
    };
    let mut out = Vec::with_capacity(expected_len(hint.liveness));
    for &bucket in buckets_for(hint.liveness) {
        for quality in QUALITY_TOKENS.iter() {
            for case_variant in [CaseVariant::Lower, CaseVariant::Upper] {
                let url = candidate_url(
                    host,
                    &hint.path_part,
                    &hint.base_id,
                    &case_variant.apply(quality.token),
                    bucket.live(),
                    bucket.container(),
                );
                out.push(CandidateTarget {
                    url,
                    container: bucket.container(),
                    quality,
                    case_variant,
                    live: bucket.live(),
                    origin,
                    priority: out.len(),
                });
            }
        }
    }
    out
}
