//! Authoritative rendition lookup: one manifest GET per video identifier.
//!
//! No retries happen here; a transport failure is a `Resolution` error and
//! the caller decides whether to fall back to candidate probing.

mod cache;
mod manifest;

use std::sync::Arc;
use std::time::Duration;

use crate::error::RipError;
use crate::model::{RenditionDescriptor, VideoId};
use crate::transport::{GetOptions, Transport};

pub use cache::RenditionCache;
pub use manifest::{parse_manifest, EntryMeta, ManifestDoc, ManifestEntry};

/// Manifests are small; anything bigger than this is not a manifest.
const MAX_MANIFEST_BYTES: u64 = 4 * 1024 * 1024;

pub struct MetadataResolver {
    transport: Arc<dyn Transport>,
    /// Endpoint template containing `{id}`.
    endpoint: String,
    timeout: Duration,
}

impl MetadataResolver {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Manifest URL for `id`.
    pub fn manifest_url(&self, id: &VideoId) -> Result<String, RipError> {
        let encoded: String = url::form_urlencoded::byte_serialize(id.as_str().as_bytes()).collect();
        let raw = self.endpoint.replace("{id}", &encoded);
        url::Url::parse(&raw)
            .map(|u| u.to_string())
            .map_err(|e| RipError::Resolution {
                url: raw,
                reason: format!("invalid manifest endpoint: {}", e),
            })
    }

    /// Fetches and parses the manifest for `id`, sorted by descending height.
    pub fn resolve(&self, id: &VideoId) -> Result<Vec<RenditionDescriptor>, RipError> {
        let url = self.manifest_url(id)?;
        tracing::debug!(video_id = %id, %url, "fetching manifest");

        let opts = GetOptions {
            timeout: self.timeout,
            max_bytes: MAX_MANIFEST_BYTES,
        };
        let body = self
            .transport
            .get(&url, opts, &mut |_, _| true)
            .map_err(|e| RipError::Resolution {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let renditions = parse_manifest(&body).map_err(|e| match e {
            RipError::Format { reason, .. } => RipError::Format {
                source_name: format!("manifest {}", url),
                reason,
            },
            other => other,
        })?;
        tracing::info!(video_id = %id, count = renditions.len(), "manifest resolved");
        Ok(renditions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContainerType;
    use crate::transport::mock::{MockRoute, MockTransport};

    const ENDPOINT: &str = "https://api.example.com/v1/videos/{id}/renditions";
    const URL: &str = "https://api.example.com/v1/videos/abc123/renditions";

    fn resolver(mock: MockTransport) -> (MetadataResolver, Arc<MockTransport>) {
        let mock = Arc::new(mock);
        let r = MetadataResolver::new(mock.clone(), ENDPOINT, Duration::from_secs(1));
        (r, mock)
    }

    #[test]
    fn resolves_and_sorts() {
        let body = br#"{ "fps": 25,
            "mp4": { "480p": { "url": "https://cdn.example.com/v.sd.mp4" } },
            "tar": { "1080p": { "url": "https://cdn.example.com/v.fhd.tar" } } }"#;
        let (r, mock) = resolver(MockTransport::new().body(URL, body));
        let id = VideoId::parse("abc123").unwrap();
        let out = r.resolve(&id).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].height, out[0].container), (1080, ContainerType::Tar));
        assert_eq!((out[1].height, out[1].container), (480, ContainerType::Mp4));
        assert_eq!(mock.calls(), vec![format!("GET {}", URL)]);
    }

    #[test]
    fn transport_failure_is_resolution_error() {
        let (r, _) = resolver(MockTransport::new().route(URL, MockRoute::Refused));
        let id = VideoId::parse("abc123").unwrap();
        match r.resolve(&id) {
            Err(RipError::Resolution { url, .. }) => assert_eq!(url, URL),
            other => panic!("expected resolution error, got {:?}", other),
        }
    }

    #[test]
    fn http_error_is_resolution_error() {
        let (r, _) = resolver(MockTransport::new().route(URL, MockRoute::Status(500)));
        let id = VideoId::parse("abc123").unwrap();
        assert!(matches!(r.resolve(&id), Err(RipError::Resolution { .. })));
    }

    #[test]
    fn garbage_body_is_format_error_naming_the_url() {
        let (r, _) = resolver(MockTransport::new().body(URL, b"<html>"));
        let id = VideoId::parse("abc123").unwrap();
        match r.resolve(&id) {
            Err(RipError::Format { source_name, .. }) => assert!(source_name.contains(URL)),
            other => panic!("expected format error, got {:?}", other),
        }
    }
}
