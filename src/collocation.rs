//! Collocation fetch & normalization.
//!
//! Raw collocations come back with the document's original casing and with
//! punctuation and numbers as separate tokens. Normalization keeps purely
//! alphabetic tokens, lowercases them and sums the counts of case variants,
//! so "Bra" and "bra" end up as one term.

use std::collections::BTreeMap;

use metrics::counter;
use tracing::{debug, warn};

use crate::error::SentimentError;
use crate::stats::{CollocationRequest, TextStatsService};

/// Normalized term → count map for one (document, keyword, window).
/// Invariant: keys are unique, lowercase and alphabetic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollocationTable {
    counts: BTreeMap<String, u64>,
}

impl CollocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, term: &str) -> Option<u64> {
        self.counts.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Terms in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(t, c)| (t.as_str(), *c))
    }
}

/// Purely alphabetic (Unicode-aware) and non-empty.
pub fn is_alphabetic_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

/// Filter, lowercase and group raw (term, count) pairs.
pub fn normalize_collocations<I, S>(raw: I) -> CollocationTable
where
    I: IntoIterator<Item = (S, u64)>,
    S: AsRef<str>,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for (term, count) in raw {
        let term = term.as_ref();
        if !is_alphabetic_token(term) {
            continue;
        }
        *counts.entry(term.to_lowercase()).or_insert(0) += count;
    }
    CollocationTable { counts }
}

impl<S: AsRef<str>> FromIterator<(S, u64)> for CollocationTable {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        normalize_collocations(iter)
    }
}

/// Result of one collocation lookup. A failed lookup still yields an (empty)
/// table so the caller can score the document as zero, but the failure is kept
/// so it can be counted instead of looking like "no collocations".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollocationFetch {
    pub table: CollocationTable,
    pub failure: Option<SentimentError>,
}

impl CollocationFetch {
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// Fetch and normalize the collocations for one request.
pub async fn fetch_collocations(
    service: &dyn TextStatsService,
    req: &CollocationRequest,
) -> CollocationFetch {
    match service.collocations(req).await {
        Ok(raw) => {
            let raw_len = raw.len();
            let table = normalize_collocations(raw);
            debug!(
                urn = %req.urn,
                word = %req.word,
                raw = raw_len,
                terms = table.len(),
                "collocations normalized"
            );
            CollocationFetch {
                table,
                failure: None,
            }
        }
        Err(e) => {
            warn!(
                error = %e,
                kind = e.kind(),
                urn = %req.urn,
                word = %req.word,
                service = service.name(),
                "collocation fetch failed, scoring document as empty"
            );
            counter!("sentiment_fetch_failures_total").increment(1);
            CollocationFetch {
                table: CollocationTable::new(),
                failure: Some(e),
            }
        }
    }
}
