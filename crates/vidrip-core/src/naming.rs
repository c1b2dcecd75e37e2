//! Output file naming: `{sanitizedTitle} - {label}.{ext}`.

/// Characters that are illegal in a file name on at least one common filesystem.
const ILLEGAL: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Used when the sanitized title comes out empty.
const FALLBACK_TITLE: &str = "video";

/// Cleans a page title for use in a file name.
///
/// - Replaces illegal characters and control characters with spaces
/// - Collapses runs of whitespace and trims the ends (including trailing dots)
/// - Keeps at most `max_chars` characters
pub fn sanitize_title(title: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(title.len());
    let mut prev_space = true;
    for c in title.chars() {
        let c = if ILLEGAL.contains(&c) || c.is_control() || c.is_whitespace() {
            ' '
        } else {
            c
        };
        if c == ' ' {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }

    let truncated: String = out.trim().chars().take(max_chars).collect();
    let cleaned = truncated.trim_end_matches(|c: char| c == ' ' || c == '.');
    if cleaned.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Everything needed to name one output file.
#[derive(Debug, Clone)]
pub struct AssetNaming {
    pub title: String,
    pub label: String,
    pub max_title_chars: usize,
}

impl AssetNaming {
    pub fn new(title: impl Into<String>, label: impl Into<String>, max_title_chars: usize) -> Self {
        Self {
            title: title.into(),
            label: label.into(),
            max_title_chars,
        }
    }

    /// `{sanitizedTitle} - {label}.{ext}`; the label is sanitized too.
    pub fn filename(&self, ext: &str) -> String {
        let label = sanitize_title(&self.label, self.max_title_chars);
        format!(
            "{} - {}.{}",
            sanitize_title(&self.title, self.max_title_chars),
            label,
            ext.trim_start_matches('.')
        )
    }
}
