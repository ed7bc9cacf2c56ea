//! cache.rs: bounded in-memory cache of scoring runs, keyed by input parameters.
//!
//! Owned by the HTTP state; the scoring engine itself keeps nothing between calls.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use crate::config::WindowConfig;
use crate::engine::ScoreRun;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    pub fn new(corpus_text: &str, keywords: &[String], window: WindowConfig) -> Self {
        let mut hasher = DefaultHasher::new();
        corpus_text.hash(&mut hasher);
        keywords.hash(&mut hasher);
        window.before.hash(&mut hasher);
        window.after.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug)]
pub struct ResultCache {
    inner: Mutex<VecDeque<(CacheKey, Arc<ScoreRun>)>>,
    cap: usize,
}

impl ResultCache {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, 1_000);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(cap)),
            cap,
        }
    }

    pub fn get(&self, key: CacheKey) -> Option<Arc<ScoreRun>> {
        let v = self.inner.lock().expect("result cache mutex poisoned");
        v.iter().find(|(k, _)| *k == key).map(|(_, run)| run.clone())
    }

    /// Insert or replace; the oldest entry is evicted beyond capacity.
    pub fn put(&self, key: CacheKey, run: Arc<ScoreRun>) {
        let mut v = self.inner.lock().expect("result cache mutex poisoned");
        v.retain(|(k, _)| *k != key);
        v.push_back((key, run));
        while v.len() > self.cap {
            v.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("result cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
