//! Data model shared by the resolver, generator, prober and pipeline.

use std::fmt;
use std::str::FromStr;

use crate::error::RipError;

/// Longest identifier accepted; real identifiers are far shorter.
const MAX_ID_LEN: usize = 128;

/// Opaque, non-empty video identifier taken from page context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Validates a raw identifier: ASCII alphanumerics, `-` and `_` only.
    pub fn parse(raw: &str) -> Result<Self, RipError> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(RipError::input(raw, "identifier is empty"));
        }
        if id.len() > MAX_ID_LEN {
            return Err(RipError::input(raw, "identifier is too long"));
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(RipError::input(
                raw,
                format!("unexpected character {:?} in identifier", bad),
            ));
        }
        Ok(VideoId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a rendition is delivered. Declaration order is the lexical order of
/// the names, which the resolver uses as its tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContainerType {
    Audio,
    Mp4,
    Tar,
}

impl ContainerType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerType::Audio => "audio",
            ContainerType::Mp4 => "mp4",
            ContainerType::Tar => "tar",
        }
    }

    /// File extension of the downloaded (not reassembled) object.
    pub fn url_extension(self) -> &'static str {
        match self {
            ContainerType::Audio => "m4a",
            ContainerType::Mp4 => "mp4",
            ContainerType::Tar => "tar",
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" | "m4a" => Ok(ContainerType::Audio),
            "mp4" => Ok(ContainerType::Mp4),
            "tar" => Ok(ContainerType::Tar),
            other => Err(format!("unknown container type: {}", other)),
        }
    }
}

/// Short CDN code for a resolution.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct QualityToken {
    pub token: &'static str,
    pub label: &'static str,
    pub height: u32,
}

/// Known quality tokens, highest rank first.
pub static QUALITY_TOKENS: [QualityToken; 5] = [
    QualityToken { token: "fhd", label: "1080p", height: 1080 },
    QualityToken { token: "hd", label: "720p", height: 720 },
    QualityToken { token: "sd", label: "480p", height: 480 },
    QualityToken { token: "ld", label: "360p", height: 360 },
    QualityToken { token: "xld", label: "240p", height: 240 },
];

impl QualityToken {
    /// Case-insensitive lookup in [`QUALITY_TOKENS`].
    pub fn lookup(token: &str) -> Option<&'static QualityToken> {
        QUALITY_TOKENS
            .iter()
            .find(|q| q.token.eq_ignore_ascii_case(token))
    }
}

/// Letter case of the quality token inside a candidate URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseVariant {
    Lower,
    Upper,
}

impl CaseVariant {
    pub fn apply(self, token: &str) -> String {
        match self {
            CaseVariant::Lower => token.to_ascii_lowercase(),
            CaseVariant::Upper => token.to_ascii_uppercase(),
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            CaseVariant::Lower => CaseVariant::Upper,
            CaseVariant::Upper => CaseVariant::Lower,
        }
    }
}

/// Where a candidate URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A supplied hint URL that already names a downloadable asset.
    Direct,
    /// Synthesized from an asset hint.
    Generated,
    /// Synthesized from an image URL; the least reliable source.
    ImageDerived,
}

/// Dedup key used by the prober: one confirmation per (token, container).
pub type ProbeKey = (&'static str, ContainerType);

/// A URL to verify, with everything needed to turn it into a rendition.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTarget {
    pub url: String,
    pub container: ContainerType,
    pub quality: &'static QualityToken,
    pub case_variant: CaseVariant,
    pub live: bool,
    pub origin: Origin,
    /// Position in dispatch order; lower is preferred.
    pub priority: usize,
}

impl CandidateTarget {
    pub fn key(&self) -> ProbeKey {
        (self.quality.token, self.container)
    }

    /// Same target with the token's letter case flipped in the file name.
    /// Returns `None` if the token cannot be located in the URL.
    pub fn case_folded(&self) -> Option<CandidateTarget> {
        let current = format!(".{}.", self.case_variant.apply(self.quality.token));
        let flipped_variant = self.case_variant.flipped();
        let replacement = format!(".{}.", flipped_variant.apply(self.quality.token));
        let file_start = self.url.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (dir, file) = self.url.split_at(file_start);
        let pos = file.find(&current)?;
        let mut url = String::with_capacity(self.url.len());
        url.push_str(dir);
        url.push_str(&file[..pos]);
        url.push_str(&replacement);
        url.push_str(&file[pos + current.len()..]);
        Some(CandidateTarget {
            url,
            case_variant: flipped_variant,
            ..self.clone()
        })
    }
}

/// Outcome of verifying one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub url: String,
    pub reachable: bool,
    pub size_bytes: Option<u64>,
}

/// One downloadable quality/format variant of a video.
#[derive(Debug, Clone, PartialEq)]
pub struct RenditionDescriptor {
    pub label: String,
    pub height: u32,
    pub container: ContainerType,
    pub url: String,
    pub size_bytes: Option<u64>,
    pub bitrate_kbps: Option<u32>,
    pub fps: Option<f64>,
}

impl RenditionDescriptor {
    pub fn normalized_label(&self) -> String {
        normalize_label(&self.label)
    }

    /// Builds a descriptor from a target the prober confirmed.
    pub fn from_probe(target: &CandidateTarget, result: &ProbeResult) -> Self {
        RenditionDescriptor {
            label: target.quality.label.to_string(),
            height: target.quality.height,
            container: target.container,
            url: result.url.clone(),
            size_bytes: result.size_bytes,
            bitrate_kbps: None,
            fps: None,
        }
    }
}

pub fn normalize_label(label: &str) -> String {
    label.trim().to_ascii_lowercase()
}

/// Descending height, then container name; stable for equal keys.
pub fn sort_renditions(renditions: &mut [RenditionDescriptor]) {
    renditions.sort_by(|a, b| {
        b.height
            .cmp(&a.height)
            .then_with(|| a.container.cmp(&b.container))
    });
}
