//! Typed manifest document and its conversion into rendition descriptors.
//!
//! The endpoint returns per-container groups keyed by label, each entry a URL
//! plus nested metadata, and one top-level frame rate. Anything that does not
//! fit this shape is rejected as a whole instead of producing half-filled
//! descriptors.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

use crate::error::RipError;
use crate::model::{normalize_label, sort_renditions, ContainerType, RenditionDescriptor};

const SOURCE: &str = "manifest";

#[derive(Debug, Deserialize)]
pub struct ManifestDoc {
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub tar: Option<BTreeMap<String, ManifestEntry>>,
    #[serde(default)]
    pub mp4: Option<BTreeMap<String, ManifestEntry>>,
    #[serde(default)]
    pub audio: Option<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    pub url: String,
    #[serde(default)]
    pub meta: EntryMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryMeta {
    pub height: Option<u32>,
    pub size: Option<u64>,
    pub bitrate: Option<u32>,
}

/// Parses a manifest body into sorted descriptors.
pub fn parse_manifest(body: &[u8]) -> Result<Vec<RenditionDescriptor>, RipError> {
    let doc: ManifestDoc = serde_json::from_slice(body)
        .map_err(|e| RipError::format(SOURCE, format!("unexpected document shape: {}", e)))?;
    doc.into_renditions()
}

impl ManifestDoc {
    fn is_empty(&self) -> bool {
        self.fps.is_none() && self.tar.is_none() && self.mp4.is_none() && self.audio.is_none()
    }

    /// Validates every entry and flattens the groups into sorted descriptors.
    pub fn into_renditions(self) -> Result<Vec<RenditionDescriptor>, RipError> {
        if self.is_empty() {
            return Err(RipError::format(SOURCE, "no rendition groups present"));
        }
        if let Some(fps) = self.fps {
            if !fps.is_finite() || fps <= 0.0 {
                return Err(RipError::format(SOURCE, format!("invalid fps {}", fps)));
            }
        }

        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let groups = [(ContainerType::Tar, self.tar), (ContainerType::Mp4, self.mp4)];
        for (container, group) in groups {
            for (label, entry) in group.into_iter().flatten() {
                let d = video_descriptor(&label, container, entry, self.fps)?;
                if !seen.insert((d.normalized_label(), container)) {
                    return Err(RipError::format(
                        SOURCE,
                        format!("duplicate {} rendition {:?}", container, label),
                    ));
                }
                out.push(d);
            }
        }
        if let Some(entry) = self.audio {
            check_url(&entry.url)?;
            out.push(RenditionDescriptor {
                label: "audio".to_string(),
                height: 0,
                container: ContainerType::Audio,
                url: entry.url,
                size_bytes: entry.meta.size,
                bitrate_kbps: entry.meta.bitrate,
                fps: None,
            });
        }

        sort_renditions(&mut out);
        Ok(out)
    }
}

fn video_descriptor(
    label: &str,
    container: ContainerType,
    entry: ManifestEntry,
    fps: Option<f64>,
) -> Result<RenditionDescriptor, RipError> {
    check_url(&entry.url)?;
    let label = label.trim();
    if label.is_empty() {
        return Err(RipError::format(SOURCE, format!("empty label in {} group", container)));
    }
    let height = entry
        .meta
        .height
        .or_else(|| height_from_label(label))
        .filter(|h| *h > 0)
        .ok_or_else(|| {
            RipError::format(SOURCE, format!("{} rendition {:?} has no height", container, label))
        })?;
    Ok(RenditionDescriptor {
        label: label.to_string(),
        height,
        container,
        url: entry.url,
        size_bytes: entry.meta.size,
        bitrate_kbps: entry.meta.bitrate,
        fps,
    })
}

/// `"720p"` -> 720.
fn height_from_label(label: &str) -> Option<u32> {
    normalize_label(label).strip_suffix('p')?.parse().ok()
}

fn check_url(raw: &str) -> Result<(), RipError> {
    match url::Url::parse(raw) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => Ok(()),
        _ => Err(RipError::format(SOURCE, format!("invalid rendition url {:?}", raw))),
    }
}
