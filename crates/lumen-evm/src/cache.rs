//! Cache of code analyses keyed by revision and code hash
//!
//! The cache holds at most a fixed number of analyses; inserting into a full
//! cache evicts the oldest entry.

use crate::revision::Revision;
use lumen_crypto::keccak256;
use lumen_primitives::H256;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Analyses kept when no capacity is given
pub const DEFAULT_CAPACITY: usize = 4096;

type Key = (Revision, H256);

struct Entries<T> {
    map: HashMap<Key, Arc<T>>,
    /// Keys in insertion order, oldest first
    order: VecDeque<Key>,
}

/// Shared analyses of previously seen code
pub struct AnalysisCache<T> {
    entries: RwLock<Entries<T>>,
    capacity: usize,
}

impl<T> Default for AnalysisCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AnalysisCache<T> {
    /// Create an empty cache holding up to [`DEFAULT_CAPACITY`] analyses
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty cache holding up to `capacity` analyses (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Entries {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Most analyses kept at once
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached analysis of `code`, if any
    pub fn get(&self, rev: Revision, code: &[u8]) -> Option<Arc<T>> {
        self.entries.read().map.get(&(rev, keccak256(code))).cloned()
    }

    /// Cached analysis of `code`, computing it with `analyze` on a miss
    pub fn get_or_insert_with(
        &self,
        rev: Revision,
        code: &[u8],
        analyze: impl FnOnce() -> T,
    ) -> Arc<T> {
        let key = (rev, keccak256(code));
        if let Some(hit) = self.entries.read().map.get(&key) {
            return Arc::clone(hit);
        }

        let analysis = Arc::new(analyze());
        let mut entries = self.entries.write();
        // another thread may have won the race; keep its entry
        if let Some(hit) = entries.map.get(&key) {
            return Arc::clone(hit);
        }
        while entries.map.len() >= self.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.map.remove(&oldest);
            tracing::debug!(rev = %oldest.0, code_hash = %oldest.1, "evicted code analysis");
        }
        tracing::trace!(%rev, code_hash = %key.1, code_size = code.len(), "caching code analysis");
        entries.order.push_back(key);
        entries.map.insert(key, Arc::clone(&analysis));
        analysis
    }

    /// Number of cached analyses
    pub fn len(&self) -> usize {
        self.entries.read().map.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().map.is_empty()
    }

    /// Drop every cached analysis
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.map.clear();
        entries.order.clear();
    }
}
