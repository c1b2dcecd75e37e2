//! libcurl-backed [`Transport`].
//!
//! Calls are blocking; each probe worker owns its own `Easy` handle per call.

use std::collections::HashMap;
use std::str;
use std::time::Duration;

use curl::easy::{Easy, List};

use super::parse::parse_headers;
use super::{GetOptions, ProgressFn, ResponseHead, Transport};
use crate::retry::FetchError;

const USER_AGENT: &str = concat!("vidrip/", env!("CARGO_PKG_VERSION"));

/// Transport over libcurl. Caller-supplied headers (cookies, auth) are sent
/// with every request unchanged.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
    headers: HashMap<String, String>,
}

impl CurlTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            headers: HashMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    fn easy(&self, url: &str, timeout: Duration) -> Result<Easy, FetchError> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout.min(timeout))?;
        easy.timeout(timeout)?;
        easy.useragent(USER_AGENT)?;

        if !self.headers.is_empty() {
            let mut list = List::new();
            for (k, v) in &self.headers {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }
        Ok(easy)
    }

    /// Performs the transfer, keeping only the head. The body (if any) is cut
    /// off at the first chunk so a server that ignores `Range` can't make a
    /// probe download the whole file.
    fn perform_head_only(&self, mut easy: Easy) -> Result<ResponseHead, FetchError> {
        let mut lines: Vec<String> = Vec::new();
        let mut cut_body = false;
        let outcome = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|_data| {
                cut_body = true;
                Ok(0)
            })?;
            transfer.perform()
        };
        if let Err(e) = outcome {
            if !(cut_body && e.is_write_error()) {
                return Err(FetchError::Curl(e));
            }
        }

        let mut head = parse_headers(&lines);
        head.status = easy.response_code()?;
        Ok(head)
    }
}

impl Transport for CurlTransport {
    fn head(&self, url: &str, timeout: Duration) -> Result<ResponseHead, FetchError> {
        let mut easy = self.easy(url, timeout)?;
        easy.nobody(true)?;
        self.perform_head_only(easy)
    }

    fn probe_range(&self, url: &str, timeout: Duration) -> Result<ResponseHead, FetchError> {
        let mut easy = self.easy(url, timeout)?;
        easy.range("0-0")?;
        self.perform_head_only(easy)
    }

    fn get(
        &self,
        url: &str,
        opts: GetOptions,
        progress: &mut ProgressFn<'_>,
    ) -> Result<Vec<u8>, FetchError> {
        let mut easy = self.easy(url, opts.timeout)?;
        easy.progress(true)?;

        let mut body: Vec<u8> = Vec::new();
        let mut too_large = false;
        let outcome = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                if body.len() as u64 + data.len() as u64 > opts.max_bytes {
                    too_large = true;
                    return Ok(0);
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.progress_function(|dltotal, dlnow, _, _| {
                let total = (dltotal > 0.0).then_some(dltotal as u64);
                progress(dlnow as u64, total)
            })?;
            transfer.perform()
        };

        if let Err(e) = outcome {
            if too_large {
                return Err(FetchError::TooLarge {
                    limit: opts.max_bytes,
                });
            }
            if e.is_aborted_by_callback() {
                return Err(FetchError::Aborted);
            }
            return Err(FetchError::Curl(e));
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        Ok(body)
    }
}
