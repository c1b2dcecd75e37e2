//! Cancellation for an in-flight request.
//!
//! One token per request. The pipeline checks it between phases; probe
//! workers check it before claiming each target; the download progress
//! callback checks it so curl aborts the transfer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::RipError;

/// Shared cancel flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(RipError::Cancelled)` once cancelled.
    pub fn check(&self) -> Result<(), RipError> {
        if self.is_cancelled() {
            Err(RipError::Cancelled)
        } else {
            Ok(())
        }
    }
}
