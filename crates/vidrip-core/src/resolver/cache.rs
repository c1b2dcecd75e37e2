//! Identifier-keyed memo of resolved renditions. In memory only.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::model::{RenditionDescriptor, VideoId};

#[derive(Debug, Default)]
pub struct RenditionCache {
    entries: RwLock<HashMap<VideoId, Vec<RenditionDescriptor>>>,
}

impl RenditionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &VideoId) -> Option<Vec<RenditionDescriptor>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn insert(&self, id: VideoId, renditions: Vec<RenditionDescriptor>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, renditions);
    }

    /// Drops the entry for `id`; returns whether there was one.
    pub fn invalidate(&self, id: &VideoId) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }
}
