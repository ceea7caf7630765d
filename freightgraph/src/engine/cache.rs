//! Bounded memo of recent rebuilds.

use super::view::PipelineView;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of views kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

/// Views keyed by input hash, least recently used evicted first.
#[derive(Debug)]
pub struct ViewCache {
    entries: Mutex<VecDeque<(String, Arc<PipelineView>)>>,
    capacity: usize,
}

impl ViewCache {
    /// Creates a cache holding at most `capacity` views. Zero disables it.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Returns the view for `key`, marking it most recently used.
    pub fn get(&self, key: &str) -> Option<Arc<PipelineView>> {
        let mut entries = self.entries.lock();
        let pos = entries.iter().position(|(k, _)| k == key)?;
        let entry = entries.remove(pos)?;
        let view = Arc::clone(&entry.1);
        entries.push_back(entry);
        Some(view)
    }

    /// Stores a view, evicting the oldest entries past capacity.
    pub fn insert(&self, key: String, view: Arc<PipelineView>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock();
        entries.retain(|(k, _)| *k != key);
        entries.push_back((key, view));
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Number of cached views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops every cached view.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
