//! Media playlist parsing. Only the parts reassembly needs: segment order,
//! an optional init section, and the tags that make a playlist unusable.

use crate::error::RipError;

/// Ordered segment references from one media playlist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistEntry {
    /// `#EXT-X-MAP` URI; fragmented-MP4 playlists need it before the first segment.
    pub init: Option<String>,
    /// References in the order given. Never reordered.
    pub segments: Vec<String>,
    /// Sum of `#EXTINF` durations, in seconds.
    pub duration_secs: f64,
}

impl PlaylistEntry {
    /// Init section (if any) followed by the segments.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.init
            .iter()
            .map(String::as_str)
            .chain(self.segments.iter().map(String::as_str))
    }
}

pub fn parse_playlist(text: &str, source_name: &str) -> Result<PlaylistEntry, RipError> {
    let mut entry = PlaylistEntry::default();
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(tag) = line.strip_prefix('#') {
            if tag.starts_with("EXT-X-STREAM-INF") {
                return Err(RipError::format(source_name, "master playlist, not a media playlist"));
            }
            if let Some(attrs) = tag.strip_prefix("EXT-X-KEY:") {
                let method = attribute(attrs, "METHOD").unwrap_or_default();
                if !method.eq_ignore_ascii_case("NONE") {
                    return Err(RipError::format(
                        source_name,
                        format!("encrypted segments ({}) are not supported", method),
                    ));
                }
            } else if let Some(attrs) = tag.strip_prefix("EXT-X-MAP:") {
                entry.init = attribute(attrs, "URI");
            } else if let Some(rest) = tag.strip_prefix("EXTINF:") {
                let secs = rest.split(',').next().unwrap_or_default();
                if let Ok(d) = secs.trim().parse::<f64>() {
                    entry.duration_secs += d;
                }
            }
            continue;
        }
        entry.segments.push(line.to_string());
    }
    Ok(entry)
}

/// Value of `NAME=value` or `NAME="value"` in an attribute list.
fn attribute(attrs: &str, name: &str) -> Option<String> {
    let mut rest = attrs;
    while !rest.is_empty() {
        let (key, after_key) = rest.split_once('=')?;
        let (value, after_value) = if let Some(quoted) = after_key.strip_prefix('"') {
            let end = quoted.find('"')?;
            (&quoted[..end], quoted[end + 1..].trim_start_matches(','))
        } else {
            match after_key.split_once(',') {
                Some((v, r)) => (v, r),
                None => (after_key, ""),
            }
        };
        if key.trim() == name {
            return Some(value.to_string());
        }
        rest = after_value;
    }
    None
}
