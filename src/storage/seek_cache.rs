use std::collections::VecDeque;

pub const DEFAULT_SEEK_CACHE_CAPACITY: usize = 32;
pub const DEFAULT_CHECKPOINT_STRIDE: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekCacheConfig {
    /// Maximum number of checkpoints kept; 0 disables the cache.
    pub capacity: usize,
    /// A checkpoint is recorded every `stride` clusters of a walk.
    pub stride: u64,
}

impl Default for SeekCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_SEEK_CACHE_CAPACITY,
            stride: DEFAULT_CHECKPOINT_STRIDE,
        }
    }
}

impl SeekCacheConfig {
    pub fn disabled() -> Self {
        Self {
            capacity: 0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub index: u64,
    pub cluster: u64,
}

#[derive(Debug, Clone)]
pub struct SeekCache {
    config: SeekCacheConfig,
    entries: VecDeque<Checkpoint>,
    hits: u64,
    misses: u64,
}

impl SeekCache {
    pub fn new(config: SeekCacheConfig) -> Self {
        Self {
            config,
            entries: VecDeque::with_capacity(config.capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn config(&self) -> SeekCacheConfig {
        self.config
    }

    /// The cached checkpoint closest to `index` without passing it.
    pub fn nearest(&mut self, index: u64) -> Option<Checkpoint> {
        let found = self
            .entries
            .iter()
            .filter(|checkpoint| checkpoint.index <= index)
            .max_by_key(|checkpoint| checkpoint.index)
            .copied();

        match found {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        found
    }

    pub fn record(&mut self, checkpoint: Checkpoint) {
        if self.config.capacity == 0 || self.entries.iter().any(|c| c.index == checkpoint.index) {
            return;
        }
        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(checkpoint);
    }

    pub fn is_boundary(&self, index: u64) -> bool {
        index % self.config.stride.max(1) == 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// (hits, misses) of `nearest` lookups so far.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
