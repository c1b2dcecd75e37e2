//! Transport errors, their classification, and the backoff policy used for
//! rendition downloads.
//!
//! Probes and the manifest fetch never retry; only the body download of a
//! chosen rendition goes through [`run_with_retry`].

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
