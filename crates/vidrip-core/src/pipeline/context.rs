//! Per-request inputs. Built fresh for every request and dropped with it.

use crate::control::CancelToken;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Raw identifier from the page; validated when the request starts.
    pub video_id: String,
    /// Page title, used for the output file name.
    pub title: Option<String>,
    /// Asset URLs observed by whoever inspects the page.
    pub hints: Vec<String>,
    /// Skip (and drop) any cached renditions for this identifier.
    pub refresh: bool,
    pub cancel: CancelToken,
}

impl RequestContext {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints = hints.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Title for file naming, falling back to the identifier.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(self.video_id.trim())
    }
}
