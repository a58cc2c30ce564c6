//! Caches for fetched tile bytes.

use std::collections::HashMap;
use std::sync::Mutex;

/// Stores fetched responses by URL.
pub trait Cache: Send + Sync + 'static {
    fn get(&self, url: &str) -> Option<Vec<u8>>;

    fn put(&self, url: &str, bytes: &[u8]);
}

/// Cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _url: &str) -> Option<Vec<u8>> {
        None
    }

    fn put(&self, _url: &str, _bytes: &[u8]) {}
}

/// In-memory cache holding at most `capacity` responses.
///
/// When full, the least recently used response is evicted.
#[derive(Debug)]
pub struct MemoryCache {
    capacity: usize,
    state: Mutex<LruState>,
}

#[derive(Debug, Default)]
struct LruState {
    entries: HashMap<String, CacheEntry>,
    access_counter: u64,
}

#[derive(Debug)]
struct CacheEntry {
    bytes: Vec<u8>,
    last_access: u64,
}

impl LruState {
    fn touch(&mut self) -> u64 {
        self.access_counter += 1;
        self.access_counter
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(url, _)| url.clone());
        if let Some(url) = oldest {
            self.entries.remove(&url);
        }
    }
}

impl MemoryCache {
    /// Default number of cached tiles.
    pub const DEFAULT_CAPACITY: usize = 50;

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Cache holding at most `capacity` responses (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::default(),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached responses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().map_or(0, |state| state.entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.clear();
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for MemoryCache {
    fn get(&self, url: &str) -> Option<Vec<u8>> {
        let mut state = self.state.lock().ok()?;
        let access = state.touch();
        let entry = state.entries.get_mut(url)?;
        entry.last_access = access;
        Some(entry.bytes.clone())
    }

    fn put(&self, url: &str, bytes: &[u8]) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let last_access = state.touch();
        if !state.entries.contains_key(url) && state.entries.len() >= self.capacity {
            state.evict_oldest();
        }
        state.entries.insert(
            url.to_string(),
            CacheEntry {
                bytes: bytes.to_vec(),
                last_access,
            },
        );
    }
}
