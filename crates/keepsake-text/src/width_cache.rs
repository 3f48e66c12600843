#![forbid(unsafe_code)]

//! LRU cache in front of a [`TextMeasure`] backend.
//!
//! Typesetting re-measures the same words over and over: every tier and
//! every font-scale candidate re-wraps the whole body. Canvas-style
//! backends are slow to ask, so the cache answers repeats locally.
//!
//! Keys are 64-bit FxHash digests of `(font, text)`, not the strings
//! themselves. Collisions are possible in principle and ignored in practice.
//!
//! Not thread-safe. Each renderer instance owns its own cache.

use std::cell::{Cell, RefCell};
use std::hash::{BuildHasher, Hash, Hasher};
use std::num::NonZeroUsize;

use lru::LruCache;
use rustc_hash::{FxBuildHasher, FxHasher};

use crate::measure::{FontSpec, TextMeasure};

/// Default cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Cache performance counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Hit rate in `0.0..=1.0`.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Memoizing wrapper around any measurer.
#[derive(Debug)]
pub struct MeasureCache<M> {
    inner: M,
    cache: RefCell<LruCache<u64, f64, FxBuildHasher>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<M: TextMeasure> MeasureCache<M> {
    /// Wrap `inner` with room for `capacity` entries (at least one).
    #[must_use]
    pub fn new(inner: M, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: RefCell::new(LruCache::with_hasher(capacity, FxBuildHasher)),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Wrap `inner` with [`DEFAULT_CACHE_CAPACITY`].
    #[must_use]
    pub fn with_default_capacity(inner: M) -> Self {
        Self::new(inner, DEFAULT_CACHE_CAPACITY)
    }

    /// The wrapped measurer.
    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Drop every entry, e.g. after a font finished loading and metrics
    /// changed underneath the cache.
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.borrow();
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
            size: cache.len(),
            capacity: cache.cap().get(),
        }
    }
}

fn hash_key(font: &FontSpec, text: &str) -> u64 {
    let mut hasher: FxHasher = FxBuildHasher.build_hasher();
    font.hash(&mut hasher);
    text.hash(&mut hasher);
    hasher.finish()
}

impl<M: TextMeasure> TextMeasure for MeasureCache<M> {
    fn ready(&self) -> bool {
        self.inner.ready()
    }

    fn measure(&self, font: &FontSpec, text: &str) -> f64 {
        let key = hash_key(font, text);
        if let Some(&width) = self.cache.borrow_mut().get(&key) {
            self.hits.set(self.hits.get() + 1);
            return width;
        }
        self.misses.set(self.misses.get() + 1);
        let width = self.inner.measure(font, text);
        self.cache.borrow_mut().put(key, width);
        width
    }
}
