//! Classification of supplied hint URLs.
//!
//! Whoever inspects the page hands us the asset URLs it saw. An asset URL
//! under `/video/` gives the path part, base id and (usually) liveness; an
//! image URL only gives a guess at the base id and is used last.

use url::Url;

use crate::model::{CandidateTarget, CaseVariant, ContainerType, Origin, QualityToken};

use super::generate;

/// Whether the video is a live recording (`.rec` URLs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Live,
    Vod,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    /// Came from an audio/video/stream URL.
    Asset,
    /// Came from a thumbnail or poster URL. Unreliable.
    Image,
}

/// Structural parts of an observed URL, input to [`generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHint {
    pub path_part: String,
    pub base_id: String,
    pub liveness: Liveness,
    pub kind: HintKind,
}

/// A classified hint URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedHint {
    pub hint: AssetHint,
    /// Set when the URL itself names a downloadable rendition.
    pub direct: Option<CandidateTarget>,
}

/// Ordered probe input built from a set of hint URLs.
#[derive(Debug, Clone, Default)]
pub struct TargetPlan {
    /// Hint the candidates were generated from, if any hint was usable.
    pub hint: Option<AssetHint>,
    pub targets: Vec<CandidateTarget>,
}

const ASSET_EXTENSIONS: [&str; 5] = ["tar", "mp4", "m4a", "m3u8", "ts"];
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Classifies one hint URL; `None` if it carries nothing usable.
pub fn classify_hint(raw: &str) -> Option<ClassifiedHint> {
    let url = Url::parse(raw.trim()).ok()?;
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let (file, dirs) = segments.split_last()?;
    // Split from the right: the base id may itself contain dots.
    let (stem, ext) = file.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();

    if ASSET_EXTENSIONS.contains(&ext.as_str()) {
        let video_at = dirs.iter().rposition(|s| *s == "video")?;
        let path_part = dirs[video_at + 1..].join("/");
        if path_part.is_empty() {
            return None;
        }
        // {baseId}.{token}[.rec]
        let (stem, live) = match stem.rsplit_once('.') {
            Some((rest, last)) if last.eq_ignore_ascii_case("rec") => (rest, true),
            _ => (stem, false),
        };
        let (base_id, token) = match stem.rsplit_once('.') {
            Some((base, token)) => (base, Some(token)),
            None => (stem, None),
        };
        if base_id.is_empty() {
            return None;
        }
        let container = match ext.as_str() {
            "tar" => Some(ContainerType::Tar),
            "mp4" => Some(ContainerType::Mp4),
            _ => None,
        };
        let liveness = match (live, container) {
            (true, _) => Liveness::Live,
            (false, Some(_)) => Liveness::Vod,
            (false, None) => Liveness::Unknown,
        };
        let direct = match (token, container) {
            (Some(token), Some(container)) => direct_target(url.as_str(), token, container, live),
            _ => None,
        };
        return Some(ClassifiedHint {
            hint: AssetHint {
                path_part,
                base_id: base_id.to_string(),
                liveness,
                kind: HintKind::Asset,
            },
            direct,
        });
    }

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        // /{namespace}/{path...}/{base}[.x].jpg, or anything under /video/.
        let path_dirs = match dirs.iter().rposition(|s| *s == "video") {
            Some(i) => &dirs[i + 1..],
            None => dirs.get(1..)?,
        };
        if path_dirs.is_empty() {
            return None;
        }
        // {baseId}[.{suffix}]
        let base_id = stem.rsplit_once('.').map_or(stem, |(base, _)| base);
        if base_id.is_empty() {
            return None;
        }
        return Some(ClassifiedHint {
            hint: AssetHint {
                path_part: path_dirs.join("/"),
                base_id: base_id.to_string(),
                liveness: Liveness::Unknown,
                kind: HintKind::Image,
            },
            direct: None,
        });
    }

    None
}

fn direct_target(url: &str, token: &str, container: ContainerType, live: bool) -> Option<CandidateTarget> {
    let quality = QualityToken::lookup(token)?;
    let case_variant = if token == token.to_ascii_lowercase() {
        CaseVariant::Lower
    } else if token == token.to_ascii_uppercase() {
        CaseVariant::Upper
    } else {
        return None;
    };
    Some(CandidateTarget {
        url: url.to_string(),
        container,
        quality,
        case_variant,
        live,
        origin: Origin::Direct,
        priority: 0,
    })
}

/// Builds the prober's input from hint URLs.
///
/// Direct targets come first (in hint order), then the generated list for the
/// first asset hint. Image hints are only used when no asset hint exists.
pub fn plan_targets(hints: &[String], host: &str) -> TargetPlan {
    let classified: Vec<ClassifiedHint> = hints.iter().filter_map(|h| classify_hint(h)).collect();

    let chosen = classified
        .iter()
        .find(|c| c.hint.kind == HintKind::Asset)
        .or_else(|| classified.iter().find(|c| c.hint.kind == HintKind::Image));
    let Some(chosen) = chosen else {
        return TargetPlan::default();
    };
    if chosen.hint.kind == HintKind::Image {
        tracing::warn!(
            base_id = %chosen.hint.base_id,
            "no asset URL observed; guessing candidates from an image URL"
        );
    }

    let mut targets: Vec<CandidateTarget> = Vec::new();
    for direct in classified.iter().filter_map(|c| c.direct.as_ref()) {
        if !targets.iter().any(|t| t.url == direct.url) {
            targets.push(direct.clone());
        }
    }
    for generated in generate(&chosen.hint, host) {
        if !targets.iter().any(|t| t.url == generated.url) {
            targets.push(generated);
        }
    }
    for (i, t) in targets.iter_mut().enumerate() {
        t.priority = i;
    }

    TargetPlan {
        hint: Some(chosen.hint.clone()),
        targets,
    }
}
