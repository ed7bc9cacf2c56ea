// src/stats/mod.rs
//! Remote text statistics: the only source of document text data.
//!
//! The pipeline never sees raw documents. It asks a `TextStatsService` for
//! collocation counts around a keyword and for plain word frequencies.

pub mod dhlab;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Collocations of `word` within `before`/`after` tokens in one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CollocationRequest {
    pub urn: String,
    pub word: String,
    pub before: usize,
    pub after: usize,
}

impl CollocationRequest {
    pub fn new(urn: impl Into<String>, word: impl Into<String>, before: usize, after: usize) -> Self {
        Self {
            urn: urn.into(),
            word: word.into(),
            before,
            after,
        }
    }
}

/// How often `word` occurs in document `urn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyRow {
    pub urn: String,
    pub word: String,
    pub count: u64,
}

#[async_trait]
pub trait TextStatsService: Send + Sync {
    /// Raw (term, count) pairs, not yet normalized. `Ok(vec![])` means the
    /// call succeeded and the keyword has no collocations.
    async fn collocations(&self, req: &CollocationRequest) -> Result<Vec<(String, u64)>>;

    /// Frequencies of `words` in each of `urns`. Absent pairs mean zero.
    async fn word_frequencies(&self, urns: &[String], words: &[String]) -> Result<Vec<FrequencyRow>>;

    fn name(&self) -> &'static str;
}
