use std::num::NonZeroUsize;

use lru::LruCache;

use super::{Structure, StructureKey};

pub const DEFAULT_CACHE_CAPACITY: usize = 100;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Bounded memo of resolved structures, least recently used evicted first
pub struct StructureCache {
    entries: LruCache<StructureKey, Structure>,
    stats: CacheStats,
}

impl std::fmt::Debug for StructureCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Default for StructureCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl StructureCache {
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Look up and mark as recently used
    pub fn get(&mut self, key: &StructureKey) -> Option<&Structure> {
        match self.entries.get(key) {
            Some(structure) => {
                self.stats.hits += 1;
                Some(structure)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Look up without touching recency or counters
    pub fn peek(&self, key: &StructureKey) -> Option<&Structure> {
        self.entries.peek(key)
    }

    pub fn contains(&self, key: &StructureKey) -> bool {
        self.entries.contains(key)
    }

    pub fn insert(&mut self, key: StructureKey, structure: Structure) {
        if let Some((evicted, _)) = self.entries.push(key, structure) {
            // push also returns the old entry when the key was already present
            if !self.entries.contains(&evicted) {
                self.stats.evictions += 1;
                tracing::debug!(fqn = %evicted.fqn, "Evicted structure from cache");
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
