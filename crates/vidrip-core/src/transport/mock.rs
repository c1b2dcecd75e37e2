//! Scripted transport for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{GetOptions, ProgressFn, ResponseHead, Transport};
use crate::retry::FetchError;

#[derive(Debug, Clone)]
pub(crate) enum MockRoute {
    Body(Vec<u8>),
    Status(u32),
    Timeout,
    /// Connection refused (curl code 7).
    Refused,
}

type Hook = Box<dyn Fn(&str) + Send + Sync>;

/// Answers from a URL -> route table; unknown URLs are 404.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: HashMap<String, MockRoute>,
    head_allowed: bool,
    calls: Mutex<Vec<String>>,
    on_probe: Option<Hook>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            head_allowed: true,
            ..Self::default()
        }
    }

    pub(crate) fn route(mut self, url: &str, route: MockRoute) -> Self {
        self.routes.insert(url.to_string(), route);
        self
    }

    pub(crate) fn body(self, url: &str, body: &[u8]) -> Self {
        self.route(url, MockRoute::Body(body.to_vec()))
    }

    pub(crate) fn reject_head(mut self) -> Self {
        self.head_allowed = false;
        self
    }

    /// Runs before every HEAD/range probe with the probed URL.
    pub(crate) fn on_probe(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_probe = Some(Box::new(hook));
        self
    }

    /// Calls so far, formatted as `"METHOD url"`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &str, url: &str) {
        self.calls.lock().unwrap().push(format!("{} {}", method, url));
    }

    fn lookup(&self, url: &str) -> Result<Option<&[u8]>, (u32, Option<FetchError>)> {
        match self.routes.get(url) {
            Some(MockRoute::Body(b)) => Ok(Some(b.as_slice())),
            Some(MockRoute::Status(code)) => Err((*code, None)),
            Some(MockRoute::Timeout) => Err((0, Some(FetchError::Timeout))),
            Some(MockRoute::Refused) => Err((0, Some(FetchError::Curl(curl::Error::new(7))))),
            None => Ok(None),
        }
    }
}

impl Transport for MockTransport {
    fn head(&self, url: &str, _timeout: Duration) -> Result<ResponseHead, FetchError> {
        self.record("HEAD", url);
        if let Some(hook) = &self.on_probe {
            hook(url);
        }
        if !self.head_allowed {
            return Ok(ResponseHead { status: 405, ..Default::default() });
        }
        match self.lookup(url) {
            Ok(Some(body)) => Ok(ResponseHead {
                status: 200,
                content_length: Some(body.len() as u64),
                ..Default::default()
            }),
            Ok(None) => Ok(ResponseHead { status: 404, ..Default::default() }),
            Err((_, Some(e))) => Err(e),
            Err((code, None)) => Ok(ResponseHead { status: code, ..Default::default() }),
        }
    }

    fn probe_range(&self, url: &str, _timeout: Duration) -> Result<ResponseHead, FetchError> {
        self.record("RANGE", url);
        if let Some(hook) = &self.on_probe {
            hook(url);
        }
        match self.lookup(url) {
            Ok(Some(body)) => Ok(ResponseHead {
                status: 206,
                content_length: Some(1),
                range_total: Some(body.len() as u64),
            }),
            Ok(None) => Ok(ResponseHead { status: 404, ..Default::default() }),
            Err((_, Some(e))) => Err(e),
            Err((code, None)) => Ok(ResponseHead { status: code, ..Default::default() }),
        }
    }

    fn get(
        &self,
        url: &str,
        opts: GetOptions,
        progress: &mut ProgressFn<'_>,
    ) -> Result<Vec<u8>, FetchError> {
        self.record("GET", url);
        let body = match self.lookup(url) {
            Ok(Some(body)) => body,
            Ok(None) => return Err(FetchError::Http(404)),
            Err((_, Some(e))) => return Err(e),
            Err((code, None)) => return Err(FetchError::Http(code)),
        };
        if body.len() as u64 > opts.max_bytes {
            return Err(FetchError::TooLarge { limit: opts.max_bytes });
        }
        let total = body.len() as u64;
        for received in [total / 2, total] {
            if !progress(received, Some(total)) {
                return Err(FetchError::Aborted);
            }
        }
        Ok(body.to_vec())
    }
}
