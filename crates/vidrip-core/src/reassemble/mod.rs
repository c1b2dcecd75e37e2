//! Turns an extracted archive into one playable file.
//!
//! The archive holds exactly one media playlist plus its segments. The
//! playlist's order is authoritative; archive order is ignored. Segments the
//! playlist names but the archive lacks are skipped and reported as a
//! [`Warning::PartialContent`].

mod playlist;

pub use playlist::{parse_playlist, PlaylistEntry};

use std::collections::HashMap;

use crate::archive::{ArchiveListing, ArchiveMember};
use crate::error::{RipError, Warning};
use crate::model::ContainerType;
use crate::naming::AssetNaming;

pub const PLAYLIST_EXTENSION: &str = "m3u8";

/// Final output handed to the save step.
#[derive(Debug, Clone)]
pub struct ReconstructedAsset {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub suggested_filename: String,
    pub warnings: Vec<Warning>,
}

/// Container the concatenated segments form, picked by the playlist shape.
fn output_format(playlist: &PlaylistEntry) -> (&'static str, &'static str) {
    if playlist.init.is_some() {
        ("video/mp4", "mp4")
    } else {
        ("video/mp2t", "ts")
    }
}

/// Member lookup by exact name, playlist-relative path, then bare file name.
struct MemberIndex<'l, 'a> {
    by_name: HashMap<&'l str, &'l ArchiveMember<'a>>,
    by_basename: HashMap<&'l str, &'l ArchiveMember<'a>>,
    playlist_dir: String,
}

impl<'l, 'a> MemberIndex<'l, 'a> {
    fn new(members: &'l [ArchiveMember<'a>], playlist_name: &str) -> Self {
        let mut by_name = HashMap::new();
        let mut by_basename = HashMap::new();
        for m in members {
            by_name.entry(m.name.as_str()).or_insert(m);
            by_basename.entry(basename(&m.name)).or_insert(m);
        }
        let playlist_dir = match playlist_name.rfind('/') {
            Some(i) => playlist_name[..=i].to_string(),
            None => String::new(),
        };
        Self {
            by_name,
            by_basename,
            playlist_dir,
        }
    }

    fn find(&self, reference: &str) -> Option<&'l ArchiveMember<'a>> {
        let clean = strip_query(reference);
        let clean = clean.strip_prefix("./").unwrap_or(clean);
        if let Some(m) = self.by_name.get(clean).copied() {
            return Some(m);
        }
        if !self.playlist_dir.is_empty() {
            let joined = format!("{}{}", self.playlist_dir, clean);
            if let Some(m) = self.by_name.get(joined.as_str()).copied() {
                return Some(m);
            }
        }
        self.by_basename.get(basename(clean)).copied()
    }
}

fn strip_query(reference: &str) -> &str {
    let end = reference.find(['?', '#']).unwrap_or(reference.len());
    &reference[..end]
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Concatenates the archive's segments in playlist order.
///
/// Fails with [`RipError::Format`] when the archive holds zero or several
/// playlists or the playlist is unusable. Unresolved references never fail
/// the call; if none resolve the asset is empty and the warning lists them all.
pub fn reassemble(listing: &ArchiveListing<'_>, naming: &AssetNaming) -> Result<ReconstructedAsset, RipError> {
    let playlists: Vec<&ArchiveMember<'_>> = listing
        .members
        .iter()
        .filter(|m| {
            m.name
                .rsplit_once('.')
                .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(PLAYLIST_EXTENSION))
        })
        .collect();
    let playlist_member = match playlists.as_slice() {
        [one] => *one,
        [] => return Err(RipError::format("archive", "no playlist member")),
        many => {
            let names: Vec<&str> = many.iter().map(|m| m.name.as_str()).collect();
            return Err(RipError::format(
                "archive",
                format!("ambiguous: {} playlist members ({})", many.len(), names.join(", ")),
            ));
        }
    };

    let text = String::from_utf8_lossy(playlist_member.payload);
    let playlist = parse_playlist(&text, &playlist_member.name)?;
    if playlist.segments.is_empty() {
        return Err(RipError::format(&playlist_member.name, "playlist lists no segments"));
    }

    let index = MemberIndex::new(&listing.members, &playlist_member.name);
    let mut bytes: Vec<u8> = Vec::new();
    let mut missing: Vec<String> = Vec::new();
    let mut included = 0usize;
    for reference in playlist.references() {
        match index.find(reference) {
            Some(member) => {
                bytes.extend_from_slice(member.payload);
                included += 1;
            }
            None => {
                tracing::warn!(segment = %reference, "segment missing from archive; skipping");
                missing.push(reference.to_string());
            }
        }
    }
    if included == 0 {
        tracing::warn!(playlist = %playlist_member.name, "no referenced segment is in the archive");
    }

    let mut warnings = Vec::new();
    if !missing.is_empty() {
        warnings.push(Warning::PartialContent { missing });
    }
    let (mime_type, ext) = output_format(&playlist);
    tracing::info!(
        segments = included,
        bytes = bytes.len(),
        duration_secs = playlist.duration_secs,
        "segments combined"
    );
    Ok(ReconstructedAsset {
        bytes,
        mime_type,
        suggested_filename: naming.filename(ext),
        warnings,
    })
}

/// Wraps a single-file rendition (mp4 or audio) that needs no extraction.
pub fn single_file(bytes: Vec<u8>, container: ContainerType, naming: &AssetNaming) -> ReconstructedAsset {
    let (mime_type, ext) = match container {
        ContainerType::Audio => ("audio/mp4", "m4a"),
        ContainerType::Mp4 | ContainerType::Tar => ("video/mp4", "mp4"),
    };
    ReconstructedAsset {
        bytes,
        mime_type,
        suggested_filename: naming.filename(ext),
        warnings: Vec::new(),
    }
}
